//! Chunk-addressed coordinate types.
//!
//! Positions in the world are never stored as a single float pair. A position
//! is split into three parts so that precision does not degrade far from the
//! origin:
//! - the chunk it lives in ([`WorldPosition::chunk`], `z` is the floor layer)
//! - the tile inside that chunk ([`WorldPosition::tile`])
//! - the fractional offset inside that tile ([`EntityPosition::offset`])
//!
//! Arithmetic only touches the finest component. Callers must
//! [`recanonicalize`](EntityPosition::recanonicalize) before using a position
//! for tile lookups.

use std::ops::{Add, AddAssign, Sub, SubAssign};

use glam::{IVec2, IVec3, Vec2};
use serde::{Deserialize, Serialize};

/// Default chunk size in tiles (width, height).
pub const DEFAULT_CHUNK_SIZE: IVec2 = IVec2::new(16, 16);

/// Position of a tile in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WorldPosition {
    /// Chunk coordinate (`z` is the floor layer)
    pub chunk: IVec3,
    /// Tile coordinate within the chunk
    pub tile: IVec2,
}

impl WorldPosition {
    /// Creates a new world position.
    #[must_use]
    pub const fn new(chunk: IVec3, tile: IVec2) -> Self {
        Self { chunk, tile }
    }

    /// Creates a position on floor 0 of chunk (0, 0) from a raw tile coordinate.
    ///
    /// The result is not canonical when `tile` lies outside the first chunk.
    #[must_use]
    pub const fn from_tile(tile: IVec2) -> Self {
        Self {
            chunk: IVec3::ZERO,
            tile,
        }
    }

    /// Rolls an out-of-range tile coordinate into the chunk coordinate.
    ///
    /// Afterwards `0 <= tile < chunk_size` on both axes. Handles negative
    /// tiles by borrowing from the chunk coordinate. `chunk_size` must be
    /// positive on both axes.
    pub fn recanonicalize(&mut self, chunk_size: IVec2) {
        self.chunk.x += self.tile.x.div_euclid(chunk_size.x);
        self.chunk.y += self.tile.y.div_euclid(chunk_size.y);
        self.tile.x = self.tile.x.rem_euclid(chunk_size.x);
        self.tile.y = self.tile.y.rem_euclid(chunk_size.y);
    }

    /// Returns a canonical copy of this position.
    #[must_use]
    pub fn canonical(mut self, chunk_size: IVec2) -> Self {
        self.recanonicalize(chunk_size);
        self
    }

    /// Returns true if the tile coordinate is inside `[0, chunk_size)`.
    #[must_use]
    pub fn is_canonical(&self, chunk_size: IVec2) -> bool {
        self.tile.x >= 0
            && self.tile.y >= 0
            && self.tile.x < chunk_size.x
            && self.tile.y < chunk_size.y
    }

    /// Signed tile span from `src` to `dst`, including cross-chunk steps.
    ///
    /// Iterating `0..=span` (or `span..=0`) on each axis visits every tile
    /// between the two positions, both ends included. Only meant for loop
    /// bounds; the floor layer is ignored.
    #[must_use]
    pub fn distance_in_tiles_inclusive(src: &Self, dst: &Self, chunk_size: IVec2) -> IVec2 {
        let chunk_delta = dst.chunk.truncate() - src.chunk.truncate();
        chunk_delta * chunk_size + (dst.tile - src.tile)
    }
}

impl Add<IVec2> for WorldPosition {
    type Output = Self;

    fn add(mut self, rhs: IVec2) -> Self {
        self.tile += rhs;
        self
    }
}

impl Sub<IVec2> for WorldPosition {
    type Output = Self;

    fn sub(mut self, rhs: IVec2) -> Self {
        self.tile -= rhs;
        self
    }
}

impl AddAssign<IVec2> for WorldPosition {
    fn add_assign(&mut self, rhs: IVec2) {
        self.tile += rhs;
    }
}

impl SubAssign<IVec2> for WorldPosition {
    fn sub_assign(&mut self, rhs: IVec2) {
        self.tile -= rhs;
    }
}

/// Position of an entity: a tile plus a fractional offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityPosition {
    /// Tile the entity is anchored to
    pub world: WorldPosition,
    /// Sub-tile offset, `[0, 1)` on both axes once canonical
    pub offset: Vec2,
}

impl EntityPosition {
    /// Creates a new entity position.
    #[must_use]
    pub const fn new(world: WorldPosition, offset: Vec2) -> Self {
        Self { world, offset }
    }

    /// Creates a position on floor 0 of chunk (0, 0).
    #[must_use]
    pub const fn from_tile(tile: IVec2, offset: Vec2) -> Self {
        Self {
            world: WorldPosition::from_tile(tile),
            offset,
        }
    }

    /// Folds offset overflow into whole tiles, then canonicalizes the tile.
    ///
    /// Afterwards `0 <= offset < 1` and `0 <= tile < chunk_size`. Idempotent.
    pub fn recanonicalize(&mut self, chunk_size: IVec2) {
        let (step_x, offset_x) = split_offset(self.offset.x);
        let (step_y, offset_y) = split_offset(self.offset.y);
        self.offset = Vec2::new(offset_x, offset_y);
        self.world.tile += IVec2::new(step_x, step_y);
        self.world.recanonicalize(chunk_size);
    }

    /// Returns a canonical copy of this position.
    #[must_use]
    pub fn canonical(mut self, chunk_size: IVec2) -> Self {
        self.recanonicalize(chunk_size);
        self
    }

    /// Vector from `src` to `dst` measured in tiles.
    ///
    /// This is the only correct way to compare positions that may sit in
    /// different chunks. Exactly antisymmetric:
    /// `distance_in_tiles(a, b) == -distance_in_tiles(b, a)`.
    #[must_use]
    pub fn distance_in_tiles(src: &Self, dst: &Self, chunk_size: IVec2) -> Vec2 {
        let chunk_delta = (dst.world.chunk.truncate() - src.world.chunk.truncate()).as_i64vec2();
        let tile_delta = (dst.world.tile - src.world.tile).as_i64vec2();
        let whole = chunk_delta * chunk_size.as_i64vec2() + tile_delta;
        whole.as_vec2() + (dst.offset - src.offset)
    }
}

/// Splits an offset into whole tile steps and a remainder in `[0, 1)`.
fn split_offset(value: f32) -> (i32, f32) {
    let steps = value.floor();
    let mut rest = value - steps;
    let mut steps = steps as i32;
    // -1e-9 floors to -1 and leaves 1.0 after rounding
    if rest >= 1.0 {
        rest = 0.0;
        steps += 1;
    }
    (steps, rest)
}

impl From<WorldPosition> for EntityPosition {
    fn from(world: WorldPosition) -> Self {
        Self {
            world,
            offset: Vec2::ZERO,
        }
    }
}

impl Add<Vec2> for EntityPosition {
    type Output = Self;

    fn add(mut self, rhs: Vec2) -> Self {
        self.offset += rhs;
        self
    }
}

impl AddAssign<Vec2> for EntityPosition {
    fn add_assign(&mut self, rhs: Vec2) {
        self.offset += rhs;
    }
}

impl SubAssign<Vec2> for EntityPosition {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.offset -= rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SIZE: IVec2 = DEFAULT_CHUNK_SIZE;

    #[test]
    fn test_world_position_overflow() {
        let mut pos = WorldPosition::from_tile(IVec2::new(17, 33));
        pos.recanonicalize(SIZE);
        assert_eq!(pos.chunk, IVec3::new(1, 2, 0));
        assert_eq!(pos.tile, IVec2::new(1, 1));
    }

    #[test]
    fn test_world_position_underflow() {
        let mut pos = WorldPosition::from_tile(IVec2::new(-1, -17));
        pos.recanonicalize(SIZE);
        assert_eq!(pos.chunk, IVec3::new(-1, -2, 0));
        assert_eq!(pos.tile, IVec2::new(15, 15));
    }

    #[test]
    fn test_world_position_keeps_floor() {
        let mut pos = WorldPosition::new(IVec3::new(0, 0, 3), IVec2::new(-5, 20));
        pos.recanonicalize(SIZE);
        assert_eq!(pos.chunk.z, 3);
    }

    #[test]
    fn test_world_position_arithmetic() {
        let pos = WorldPosition::from_tile(IVec2::new(4, 4));
        assert_eq!((pos + IVec2::new(2, -1)).tile, IVec2::new(6, 3));
        assert_eq!((pos - IVec2::new(5, 0)).tile, IVec2::new(-1, 4));

        let mut pos = pos;
        pos += IVec2::ONE;
        pos -= IVec2::new(0, 2);
        assert_eq!(pos.tile, IVec2::new(5, 3));
    }

    #[test]
    fn test_inclusive_distance_across_chunks() {
        let src = WorldPosition::new(IVec3::new(0, 0, 0), IVec2::new(15, 3));
        let dst = WorldPosition::new(IVec3::new(1, 0, 0), IVec2::new(1, 3));
        let span = WorldPosition::distance_in_tiles_inclusive(&src, &dst, SIZE);
        assert_eq!(span, IVec2::new(2, 0));
        assert_eq!(
            WorldPosition::distance_in_tiles_inclusive(&dst, &src, SIZE),
            IVec2::new(-2, 0)
        );
    }

    #[test]
    fn test_entity_position_offset_folding() {
        let mut pos = EntityPosition::from_tile(IVec2::new(15, 0), Vec2::new(1.25, -0.5));
        pos.recanonicalize(SIZE);
        assert_eq!(pos.world.chunk, IVec3::new(1, -1, 0));
        assert_eq!(pos.world.tile, IVec2::new(0, 15));
        assert!((pos.offset - Vec2::new(0.25, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_entity_position_tiny_negative_offset() {
        let mut pos = EntityPosition::from_tile(IVec2::new(3, 3), Vec2::new(-1e-9, 0.0));
        pos.recanonicalize(SIZE);
        assert!(pos.offset.x >= 0.0 && pos.offset.x < 1.0);
        assert_eq!(pos.world.tile, IVec2::new(3, 3));
    }

    #[test]
    fn test_entity_position_add_only_touches_offset() {
        let pos = EntityPosition::from_tile(IVec2::new(2, 2), Vec2::ZERO) + Vec2::new(3.5, 0.0);
        assert_eq!(pos.world.tile, IVec2::new(2, 2));
        assert_eq!(pos.offset, Vec2::new(3.5, 0.0));
    }

    #[test]
    fn test_distance_in_tiles_across_chunks() {
        let a = EntityPosition::new(
            WorldPosition::new(IVec3::new(-1, 0, 0), IVec2::new(15, 0)),
            Vec2::new(0.5, 0.0),
        );
        let b = EntityPosition::new(
            WorldPosition::new(IVec3::new(0, 0, 0), IVec2::new(0, 0)),
            Vec2::new(0.25, 0.0),
        );
        let dist = EntityPosition::distance_in_tiles(&a, &b, SIZE);
        assert!((dist - Vec2::new(0.75, 0.0)).length() < 1e-6);
    }

    fn entity_position() -> impl Strategy<Value = EntityPosition> {
        (
            -1000i32..1000,
            -1000i32..1000,
            -3i32..3,
            -64i32..64,
            -64i32..64,
            -8.0f32..8.0,
            -8.0f32..8.0,
        )
            .prop_map(|(cx, cy, cz, tx, ty, ox, oy)| {
                EntityPosition::new(
                    WorldPosition::new(IVec3::new(cx, cy, cz), IVec2::new(tx, ty)),
                    Vec2::new(ox, oy),
                )
            })
    }

    fn chunk_size() -> impl Strategy<Value = IVec2> {
        (1i32..64, 1i32..64).prop_map(|(x, y)| IVec2::new(x, y))
    }

    proptest! {
        #[test]
        fn prop_recanonicalize_is_idempotent(pos in entity_position(), size in chunk_size()) {
            let once = pos.canonical(size);
            let twice = once.canonical(size);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_recanonicalize_range(pos in entity_position(), size in chunk_size()) {
            let canon = pos.canonical(size);
            prop_assert!(canon.offset.x >= 0.0 && canon.offset.x < 1.0);
            prop_assert!(canon.offset.y >= 0.0 && canon.offset.y < 1.0);
            prop_assert!(canon.world.is_canonical(size));
        }

        #[test]
        fn prop_recanonicalize_preserves_location(pos in entity_position(), size in chunk_size()) {
            let origin = EntityPosition::default();
            let before = EntityPosition::distance_in_tiles(&origin, &pos, size);
            let after = EntityPosition::distance_in_tiles(&origin, &pos.canonical(size), size);
            prop_assert!((before - after).length() < 5e-2);
        }

        #[test]
        fn prop_distance_is_antisymmetric(
            a in entity_position(),
            b in entity_position(),
            size in chunk_size(),
        ) {
            let ab = EntityPosition::distance_in_tiles(&a, &b, size);
            let ba = EntityPosition::distance_in_tiles(&b, &a, size);
            prop_assert_eq!(ab, -ba);
        }
    }
}
