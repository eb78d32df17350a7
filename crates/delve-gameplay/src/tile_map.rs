//! Chunked tile storage and the terrain queries the collision core needs.
//!
//! The core only talks to terrain through two traits:
//! - [`TileLookup`]: which tile type sits at a world position
//! - [`SurfaceQuery`]: friction and acceleration modifier under a position
//!
//! [`TileMap`] is the in-memory implementation used by the level. Chunks that
//! were never written read back as [`TileType::Void`].

use ahash::AHashMap;
use delve_common::{EntityPosition, WorldPosition, DEFAULT_CHUNK_SIZE};
use glam::{IVec2, IVec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Terrain tile types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileType {
    /// Nothing there (unloaded or never generated)
    #[default]
    Void,
    /// Blocks movement
    Wall,
    /// Plain floor
    StoneGround,
    /// Slippery floor
    StoneIceGround,
    /// Floor that boosts acceleration
    StoneSpeedGround,
}

impl TileType {
    /// Returns true if this tile blocks movement.
    ///
    /// Walls are the only blocking type; void is handled separately by spawn
    /// validation.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Wall)
    }

    /// Returns true if a body may not rest on this tile.
    #[must_use]
    pub const fn obstructs_placement(self) -> bool {
        matches!(self, Self::Wall | Self::Void)
    }
}

/// Tile type lookup by world position.
pub trait TileLookup {
    /// Chunk size in tiles. Must be positive on both axes.
    fn chunk_size(&self) -> IVec2;

    /// Tile type at a world position. The movement core only passes
    /// canonical positions.
    ///
    /// Returns [`TileType::Void`] for chunks that do not exist.
    fn tile_type(&self, position: WorldPosition) -> TileType;
}

/// Movement properties of the ground under an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    /// Velocity decay per second (1.0 stops a body in one second)
    pub friction: f32,
    /// Multiplier on the body's acceleration scale
    pub acceleration_modifier: f32,
}

impl Surface {
    /// Creates a new surface description.
    #[must_use]
    pub const fn new(friction: f32, acceleration_modifier: f32) -> Self {
        Self {
            friction,
            acceleration_modifier,
        }
    }
}

/// Friction and acceleration lookup by entity position.
pub trait SurfaceQuery {
    /// Surface at a canonical entity position.
    fn surface_at(&self, position: &EntityPosition) -> Surface;

    /// Replaces the per-tile surface values.
    fn set_surfaces(&mut self, surfaces: SurfaceTable);
}

/// Friction and acceleration values per tile type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceTable {
    /// Friction on every tile without a special value
    pub friction: f32,
    /// Friction on ice
    pub ice_friction: f32,
    /// Acceleration modifier on speed ground
    pub speed_acceleration: f32,
}

impl Default for SurfaceTable {
    fn default() -> Self {
        Self {
            friction: 2.0,
            ice_friction: 0.1,
            speed_acceleration: 2.0,
        }
    }
}

impl SurfaceTable {
    /// Friction for a tile type.
    #[must_use]
    pub fn friction_for(&self, tile: TileType) -> f32 {
        match tile {
            TileType::StoneIceGround => self.ice_friction,
            _ => self.friction,
        }
    }

    /// Acceleration modifier for a tile type.
    #[must_use]
    pub fn acceleration_modifier_for(&self, tile: TileType) -> f32 {
        match tile {
            TileType::StoneSpeedGround => self.speed_acceleration,
            _ => 1.0,
        }
    }

    /// Surface for a tile type.
    #[must_use]
    pub fn surface_for(&self, tile: TileType) -> Surface {
        Surface::new(self.friction_for(tile), self.acceleration_modifier_for(tile))
    }
}

/// A fixed-size grid of tiles, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileChunk {
    size: IVec2,
    tiles: Vec<TileType>,
}

impl TileChunk {
    /// Creates a chunk filled with [`TileType::Void`].
    #[must_use]
    pub fn new(size: IVec2) -> Self {
        Self {
            size,
            tiles: vec![TileType::Void; (size.x * size.y) as usize],
        }
    }

    /// Converts a local tile coordinate to an index, if in bounds.
    fn index(&self, tile: IVec2) -> Option<usize> {
        let in_bounds = tile.x >= 0 && tile.y >= 0 && tile.x < self.size.x && tile.y < self.size.y;
        in_bounds.then(|| (tile.y * self.size.x + tile.x) as usize)
    }

    /// Tile type at a local coordinate; out of bounds reads as void.
    #[must_use]
    pub fn tile_type(&self, tile: IVec2) -> TileType {
        self.index(tile)
            .and_then(|index| self.tiles.get(index).copied())
            .unwrap_or_default()
    }

    /// Sets the tile type at a local coordinate. Out of bounds is ignored.
    pub fn set_tile_type(&mut self, tile: IVec2, tile_type: TileType) {
        if let Some(slot) = self.index(tile).and_then(|index| self.tiles.get_mut(index)) {
            *slot = tile_type;
        }
    }
}

/// Chunked, unbounded tile map.
#[derive(Debug, Clone)]
pub struct TileMap {
    chunk_size: IVec2,
    chunks: AHashMap<IVec3, TileChunk>,
    surfaces: SurfaceTable,
}

impl TileMap {
    /// Creates an empty map with the given chunk size.
    #[must_use]
    pub fn new(chunk_size: IVec2) -> Self {
        Self {
            chunk_size,
            chunks: AHashMap::new(),
            surfaces: SurfaceTable::default(),
        }
    }

    /// Returns the surface table.
    #[must_use]
    pub const fn surfaces(&self) -> &SurfaceTable {
        &self.surfaces
    }

    /// Number of allocated chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Sets a tile, allocating its chunk if needed.
    pub fn set_tile_type(&mut self, position: WorldPosition, tile_type: TileType) {
        let position = position.canonical(self.chunk_size);
        let chunk_size = self.chunk_size;
        let chunk = self.chunks.entry(position.chunk).or_insert_with(|| {
            debug!("Allocating tile chunk {:?}", position.chunk);
            TileChunk::new(chunk_size)
        });
        chunk.set_tile_type(position.tile, tile_type);
    }

    /// Fills a rectangle of `dimensions` tiles starting at `start`.
    pub fn fill_rect(&mut self, start: WorldPosition, dimensions: IVec2, tile_type: TileType) {
        for y in 0..dimensions.y {
            for x in 0..dimensions.x {
                self.set_tile_type(start + IVec2::new(x, y), tile_type);
            }
        }
    }

    /// Returns true if every tile in the rectangle has `tile_type`.
    #[must_use]
    pub fn is_rectangle_of_tile_type(
        &self,
        start: WorldPosition,
        dimensions: IVec2,
        tile_type: TileType,
    ) -> bool {
        (0..dimensions.y).all(|y| {
            (0..dimensions.x).all(|x| {
                self.tile_type(start + IVec2::new(x, y)) == tile_type
            })
        })
    }

    /// Canonicalizes an entity position with this map's chunk size.
    pub fn recanonicalize(&self, position: &mut EntityPosition) {
        position.recanonicalize(self.chunk_size);
    }
}

impl TileLookup for TileMap {
    fn chunk_size(&self) -> IVec2 {
        self.chunk_size
    }

    fn tile_type(&self, position: WorldPosition) -> TileType {
        let position = position.canonical(self.chunk_size);
        self.chunks
            .get(&position.chunk)
            .map_or(TileType::Void, |chunk| chunk.tile_type(position.tile))
    }
}

impl SurfaceQuery for TileMap {
    fn surface_at(&self, position: &EntityPosition) -> Surface {
        self.surfaces.surface_for(self.tile_type(position.world))
    }

    fn set_surfaces(&mut self, surfaces: SurfaceTable) {
        self.surfaces = surfaces;
    }
}

/// Builder for rectangular test rooms.
///
/// Produces a floor of `StoneGround` surrounded by a one-tile wall.
#[derive(Debug, Clone, Copy)]
pub struct TileMapBuilder {
    chunk_size: IVec2,
}

impl Default for TileMapBuilder {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl TileMapBuilder {
    /// Creates a builder with the given chunk size.
    #[must_use]
    pub const fn new(chunk_size: IVec2) -> Self {
        Self { chunk_size }
    }

    /// Builds a walled room whose top-left wall tile is at `origin`.
    ///
    /// `size` includes the walls.
    #[must_use]
    pub fn room(self, origin: WorldPosition, size: IVec2) -> TileMap {
        let mut map = TileMap::new(self.chunk_size);
        map.fill_rect(origin, size, TileType::Wall);
        map.fill_rect(origin + IVec2::ONE, size - IVec2::splat(2), TileType::StoneGround);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_chunk_is_void() {
        let map = TileMap::new(DEFAULT_CHUNK_SIZE);
        let position = WorldPosition::new(IVec3::new(100, -40, 2), IVec2::new(3, 3));
        assert_eq!(map.tile_type(position), TileType::Void);
    }

    #[test]
    fn test_set_and_get_across_chunks() {
        let mut map = TileMap::new(DEFAULT_CHUNK_SIZE);
        map.set_tile_type(WorldPosition::from_tile(IVec2::new(-1, 20)), TileType::Wall);

        let canonical = WorldPosition::new(IVec3::new(-1, 1, 0), IVec2::new(15, 4));
        assert_eq!(map.tile_type(canonical), TileType::Wall);
        assert_eq!(map.chunk_count(), 1);
    }

    #[test]
    fn test_lookup_canonicalizes() {
        let mut map = TileMap::new(DEFAULT_CHUNK_SIZE);
        map.set_tile_type(WorldPosition::from_tile(IVec2::new(-3, 2)), TileType::Wall);
        assert_eq!(
            map.tile_type(WorldPosition::from_tile(IVec2::new(-3, 2))),
            TileType::Wall
        );
    }

    #[test]
    fn test_recanonicalize_entity_position() {
        let map = TileMap::new(IVec2::splat(8));
        let mut position = EntityPosition::from_tile(IVec2::new(7, 0), glam::Vec2::new(1.5, -0.5));
        map.recanonicalize(&mut position);

        assert_eq!(position.world.chunk, IVec3::new(1, -1, 0));
        assert_eq!(position.world.tile, IVec2::new(0, 7));
        assert_eq!(position.offset, glam::Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_chunk_out_of_bounds_reads_void() {
        let mut chunk = TileChunk::new(IVec2::splat(4));
        chunk.set_tile_type(IVec2::new(9, 9), TileType::Wall);
        assert_eq!(chunk.tile_type(IVec2::new(9, 9)), TileType::Void);
        assert_eq!(chunk.tile_type(IVec2::new(-1, 0)), TileType::Void);
    }

    #[test]
    fn test_room_builder() {
        let map = TileMapBuilder::default().room(WorldPosition::default(), IVec2::new(6, 5));

        assert_eq!(map.tile_type(WorldPosition::from_tile(IVec2::ZERO)), TileType::Wall);
        assert_eq!(
            map.tile_type(WorldPosition::from_tile(IVec2::new(5, 4))),
            TileType::Wall
        );
        assert!(map.is_rectangle_of_tile_type(
            WorldPosition::from_tile(IVec2::ONE),
            IVec2::new(4, 3),
            TileType::StoneGround
        ));
        assert!(!map.is_rectangle_of_tile_type(
            WorldPosition::default(),
            IVec2::new(2, 2),
            TileType::StoneGround
        ));
    }

    #[test]
    fn test_surface_values() {
        let mut map = TileMap::new(DEFAULT_CHUNK_SIZE);
        map.set_tile_type(WorldPosition::from_tile(IVec2::new(1, 1)), TileType::StoneIceGround);
        map.set_tile_type(WorldPosition::from_tile(IVec2::new(2, 1)), TileType::StoneSpeedGround);

        let ice = map.surface_at(&EntityPosition::from_tile(IVec2::new(1, 1), glam::Vec2::ZERO));
        assert_eq!(ice, Surface::new(0.1, 1.0));

        let speed = map.surface_at(&EntityPosition::from_tile(IVec2::new(2, 1), glam::Vec2::ZERO));
        assert_eq!(speed, Surface::new(2.0, 2.0));

        let void = map.surface_at(&EntityPosition::default());
        assert_eq!(void, Surface::new(2.0, 1.0));
    }

    #[test]
    fn test_only_walls_block() {
        assert!(TileType::Wall.is_blocking());
        assert!(!TileType::Void.is_blocking());
        assert!(!TileType::StoneIceGround.is_blocking());
        assert!(TileType::Void.obstructs_placement());
        assert!(!TileType::StoneGround.obstructs_placement());
    }
}
