//! # Delve Common
//!
//! Shared types for the Delve movement and collision core.
//!
//! This crate provides the foundational types every other crate builds on:
//! - Chunk-addressed coordinates (world, entity)
//! - Generational entity handles
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{IVec2, IVec3, Vec2};

    #[test]
    fn test_chunk_coords_conversion() {
        let world = WorldPosition::from_tile(IVec2::new(100, 200)).canonical(IVec2::splat(32));

        assert_eq!(world.chunk, IVec3::new(3, 6, 0));
        assert_eq!(world.tile, IVec2::new(4, 8));
    }

    #[test]
    fn test_entity_handle_identity() {
        let a = EntityHandle::new(3, 0);
        let b = EntityHandle::new(3, 1);
        assert_ne!(a, b);
        assert_eq!(a.index(), b.index());
        assert_eq!(b.to_string(), "3v1");
    }

    #[test]
    fn test_entity_position_from_world() {
        let world = WorldPosition::from_tile(IVec2::new(7, 5));
        let pos = EntityPosition::from(world);
        assert_eq!(pos.offset, Vec2::ZERO);
        assert_eq!(pos.world, world);
    }
}
