//! # Delve Gameplay
//!
//! Movement and collision core for Delve.
//!
//! This crate moves kinetic entities through a chunked tile world:
//! - Rectangle math and swept time-of-impact tests
//! - Body state and the per-tick integrator
//! - Tile map with per-tile friction and acceleration
//! - Entity arena with deferred insertion and removal
//! - Terrain and entity sweeps with epsilon pull-back
//! - Level tick, spawn validation and line of sight
//! - Stock behaviors (particles, bullets, walkers)
//! - TOML configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod collision;
pub mod collision_response;
pub mod config;
pub mod entity;
pub mod error;
pub mod level;
pub mod physics;
pub mod rect;
pub mod tile_map;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::collision::*;
    pub use crate::collision_response::*;
    pub use crate::config::*;
    pub use crate::entity::*;
    pub use crate::error::*;
    pub use crate::level::*;
    pub use crate::physics::*;
    pub use crate::rect::*;
    pub use crate::tile_map::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use delve_common::{EntityPosition, WorldPosition};
    use glam::{IVec2, Vec2};

    #[test]
    fn test_level_round_trip() {
        let map = TileMapBuilder::default().room(WorldPosition::default(), IVec2::new(10, 10));
        let mut level = Level::new(map, PhysicsConfig::default());

        let body = Body::new(EntityPosition::from_tile(IVec2::new(4, 4), Vec2::ZERO), Vec2::ONE)
            .with_velocity(Vec2::new(3.0, 0.0));
        let handle = level.spawn(Entity::new(body, Walker::default())).expect("free spot");

        let summary = level.tick(1.0 / 60.0);
        assert_eq!(summary.registered, 1);
        assert_eq!(summary.moved, 1);
        assert!(level.entities().is_alive(handle));
    }

    #[test]
    fn test_surface_friction_slows_body() {
        let mut body = Body::new(EntityPosition::default(), Vec2::ONE).with_velocity(Vec2::X);
        let surface = SurfaceTable::default().surface_for(TileType::StoneGround);
        body.position_delta_with_modifier(0.25, surface.friction, surface.acceleration_modifier);
        assert!((body.velocity().x - 0.5).abs() < 1e-6);
    }
}
