//! Level orchestration: the per-tick movement pipeline.
//!
//! A tick runs, in order:
//! 1. flush entities spawned since the last tick
//! 2. kill every entity that overlaps terrain or another entity
//! 3. for each live entity: behavior update, integration, sweep, resolution
//! 4. remove dead entities
//!
//! Resolution applies the allowed fraction of the displacement. When a hit
//! was found the reactions run first: for an entity hit the struck entity
//! reacts before the mover.

use delve_common::{EntityHandle, EntityPosition};
use glam::{IVec2, Vec2};
use tracing::{debug, info, trace, warn};

use crate::collision::{
    affected_tiles, arbitrate, check_entity_collision, check_world_collision, CollisionCheckData,
    EntityCollisionResult,
};
use crate::config::PhysicsConfig;
use crate::entity::{Entity, EntityArena, EntityError, EntityResult};
use crate::physics::Body;
use crate::rect::{CollisionPlane, FloatRect};
use crate::tile_map::{SurfaceQuery, TileLookup, TileMap, TileType};

/// Distance between line-of-sight samples, in tiles.
const SIGHT_STEP: f32 = 0.3;

/// Distance between cardinal line-of-sight samples, in tiles.
const CARDINAL_SIGHT_STEP: f32 = 0.1;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Entities that became live at the start of the tick
    pub registered: usize,
    /// Entities killed for overlapping terrain or other entities
    pub killed_overlapping: usize,
    /// Entities that were integrated and swept
    pub moved: usize,
    /// Sweeps stopped by terrain
    pub world_hits: usize,
    /// Sweeps stopped by another entity
    pub entity_hits: usize,
    /// Dead entities removed at the end of the tick
    pub removed: usize,
}

/// Terrain plus the entities moving through it.
#[derive(Debug)]
pub struct Level<M = TileMap> {
    tiles: M,
    entities: EntityArena,
    config: PhysicsConfig,
}

impl<M> Level<M>
where
    M: TileLookup + SurfaceQuery,
{
    /// Creates a level over `tiles` with no entities.
    ///
    /// The configured surface table replaces whatever `tiles` carried.
    pub fn new(mut tiles: M, config: PhysicsConfig) -> Self {
        tiles.set_surfaces(config.surfaces);
        if tiles.chunk_size() != config.chunk_size {
            warn!(
                "Tile map chunk size {} differs from configured {}; using the map's",
                tiles.chunk_size(),
                config.chunk_size
            );
        }
        info!("Level created with chunk size {}", tiles.chunk_size());
        Self {
            tiles,
            entities: EntityArena::new(),
            config,
        }
    }

    /// Returns the terrain.
    pub const fn tiles(&self) -> &M {
        &self.tiles
    }

    /// Returns the terrain mutably.
    pub fn tiles_mut(&mut self) -> &mut M {
        &mut self.tiles
    }

    /// Returns the entity arena.
    pub const fn entities(&self) -> &EntityArena {
        &self.entities
    }

    /// Returns the entity arena mutably.
    pub fn entities_mut(&mut self) -> &mut EntityArena {
        &mut self.entities
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Chunk size used for every position in this level.
    pub fn chunk_size(&self) -> IVec2 {
        self.tiles.chunk_size()
    }

    /// Queues `entity` for the next tick if its spot is free.
    ///
    /// The body's position is canonicalized first. A body that would overlap
    /// a wall, void, or (if it collides with entities) another live entity is
    /// rejected with [`EntityError::Obstructed`].
    pub fn spawn(&mut self, mut entity: Entity) -> EntityResult<EntityHandle> {
        let position = entity.body().position().canonical(self.chunk_size());
        entity.body_mut().set_position(position);

        if self.is_colliding_with_level(entity.body(), entity.collides_with_entities(), None) {
            warn!(
                "Rejected {} spawn at {:?}",
                entity.behavior().name(),
                position
            );
            return Err(EntityError::Obstructed(position));
        }
        Ok(self.entities.insert_pending(entity))
    }

    /// Sweeps the entity `handle` along `delta` without moving it.
    pub fn check_collisions(
        &self,
        handle: EntityHandle,
        delta: Vec2,
    ) -> EntityResult<EntityCollisionResult> {
        let entity = self.entities.try_get(handle)?;
        Ok(self.sweep(
            Some(handle),
            entity.body(),
            entity.collides_with_entities(),
            delta,
        ))
    }

    /// Sweeps `body` along `delta` against terrain and, optionally, entities.
    fn sweep(
        &self,
        mover: Option<EntityHandle>,
        body: &Body,
        collides_with_entities: bool,
        delta: Vec2,
    ) -> EntityCollisionResult {
        if delta == Vec2::ZERO {
            return EntityCollisionResult::default();
        }

        let data = CollisionCheckData::for_body(body, delta);
        let world = check_world_collision(&data, &self.tiles);
        let entity = if collides_with_entities {
            check_entity_collision(
                mover,
                &data,
                &self.entities,
                self.chunk_size(),
                self.config.collision.entity_cull_radius,
            )
        } else {
            EntityCollisionResult::default()
        };
        arbitrate(world, entity, delta, &self.config.collision)
    }

    /// Advances the level by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickSummary {
        let mut summary = TickSummary {
            registered: self.entities.flush_pending(),
            killed_overlapping: self.kill_colliding_entities(),
            ..TickSummary::default()
        };

        for handle in self.entities.handles() {
            self.step_entity(handle, dt, &mut summary);
        }

        summary.removed = self.entities.sweep_dead().len();
        trace!("Tick finished: {:?}", summary);
        summary
    }

    /// Update, integrate, sweep and resolve one entity.
    fn step_entity(&mut self, handle: EntityHandle, dt: f32, summary: &mut TickSummary) {
        let chunk_size = self.chunk_size();
        let Some(entity) = self.entities.get_mut(handle) else {
            return;
        };
        if !entity.is_alive() {
            return;
        }

        let ground_position = entity.body().collision_center().canonical(chunk_size);
        let ground = self.tiles.surface_at(&ground_position);

        let (body, behavior) = entity.split_mut();
        behavior.update(body, dt);
        let surface = behavior.surface(ground);
        let delta =
            body.position_delta_with_modifier(dt, surface.friction, surface.acceleration_modifier);

        let Ok(result) = self.check_collisions(handle, delta) else {
            return;
        };
        summary.moved += 1;
        if result.is_collision() {
            if result.collided_entity.is_some() {
                summary.entity_hits += 1;
            } else {
                summary.world_hits += 1;
            }
        }
        self.resolve(handle, &result, delta);
    }

    /// Runs the reactions for `result` and applies the allowed displacement.
    fn resolve(&mut self, handle: EntityHandle, result: &EntityCollisionResult, delta: Vec2) {
        let chunk_size = self.chunk_size();

        if result.is_collision() {
            match result.collided_entity {
                Some(other) => self.react_to_entity(handle, other, result.plane),
                None => {
                    if let Some(entity) = self.entities.get_mut(handle) {
                        let (body, behavior) = entity.split_mut();
                        behavior.on_world_collision(body, result.plane);
                    }
                },
            }
        }

        if let Some(entity) = self.entities.get_mut(handle) {
            entity
                .body_mut()
                .advance(delta * result.max_allowed_t, chunk_size);
        }
    }

    fn react_to_entity(&mut self, mover: EntityHandle, struck: EntityHandle, plane: CollisionPlane) {
        let Some((mover_entity, struck_entity)) = self.entities.get_pair_mut(mover, struck) else {
            return;
        };
        debug!(
            "{} {} hit {} {} on {:?}",
            mover_entity.behavior().name(),
            mover,
            struck_entity.behavior().name(),
            struck,
            plane
        );

        let (mover_body, mover_behavior) = mover_entity.split_mut();
        let (struck_body, struck_behavior) = struck_entity.split_mut();
        struck_behavior.on_entity_collision(struck_body, plane, mover_body);
        mover_behavior.on_entity_collision(mover_body, plane, struck_body);
    }

    /// Returns true if `body` at rest overlaps a wall or void tile, or
    /// (when `collides_with_entities`) a live entity other than `ignore`.
    ///
    /// `body` must have a canonical position.
    pub fn is_colliding_with_level(
        &self,
        body: &Body,
        collides_with_entities: bool,
        ignore: Option<EntityHandle>,
    ) -> bool {
        let chunk_size = self.chunk_size();
        let rect = body.collision_rect();
        let data = CollisionCheckData::for_body(body, Vec2::ZERO);

        let on_bad_tile = affected_tiles(&data, chunk_size).into_iter().any(|tile| {
            if !self.tiles.tile_type(tile).obstructs_placement() {
                return false;
            }
            let local =
                EntityPosition::distance_in_tiles(body.position(), &EntityPosition::from(tile), chunk_size);
            FloatRect::new(local.x, local.y, 1.0, 1.0).collides_with(&rect)
        });
        if on_bad_tile {
            return true;
        }
        if !collides_with_entities {
            return false;
        }

        self.entities.iter().any(|(handle, other)| {
            if Some(handle) == ignore || !other.is_alive() || !other.collides_with_entities() {
                return false;
            }
            let other_body = other.body();
            let local = EntityPosition::distance_in_tiles(body.position(), other_body.position(), chunk_size);
            other_body.collision_rect().translated(local).collides_with(&rect)
        })
    }

    /// Marks every live entity that overlaps the level as dead.
    ///
    /// Returns how many were killed.
    pub fn kill_colliding_entities(&mut self) -> usize {
        let colliding: Vec<EntityHandle> = self
            .entities
            .iter()
            .filter(|(handle, entity)| {
                entity.is_alive()
                    && self.is_colliding_with_level(
                        entity.body(),
                        entity.collides_with_entities(),
                        Some(*handle),
                    )
            })
            .map(|(handle, _)| handle)
            .collect();

        for &handle in &colliding {
            if let Some(entity) = self.entities.get_mut(handle) {
                debug!("Killing overlapping {} {}", entity.behavior().name(), handle);
                entity.body_mut().die();
            }
        }
        colliding.len()
    }

    /// Returns true if no wall lies between the collision centers of `a` and
    /// `b` and they are closer than `max_range`.
    pub fn can_see_each_other(
        &self,
        a: EntityHandle,
        b: EntityHandle,
        max_range: f32,
    ) -> EntityResult<bool> {
        let chunk_size = self.chunk_size();
        let mut probe = self.entities.try_get(a)?.body().collision_center().canonical(chunk_size);
        let target = self.entities.try_get(b)?.body().collision_center().canonical(chunk_size);

        let delta = EntityPosition::distance_in_tiles(&probe, &target, chunk_size);
        let distance = delta.length();
        if distance >= max_range {
            return Ok(false);
        }

        let direction = delta.normalize_or_zero();
        let steps = (distance / SIGHT_STEP) as u32;
        for _ in 0..steps {
            probe += direction * SIGHT_STEP;
            probe.recanonicalize(chunk_size);
            if self.tiles.tile_type(probe.world) == TileType::Wall {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Unit axis direction from `a` along which `b` is visible, or zero.
    ///
    /// Probes straight along the Y axis first, then the X axis, each for the
    /// matching component of the distance between collision centers. A probe
    /// stops at the first wall and succeeds once it enters `b`'s collision
    /// rectangle. Axes whose distance is not below `max_range` are skipped.
    pub fn can_see_each_other_cardinal(
        &self,
        a: EntityHandle,
        b: EntityHandle,
        max_range: f32,
    ) -> EntityResult<Vec2> {
        let chunk_size = self.chunk_size();
        let origin = self.entities.try_get(a)?.body().collision_center().canonical(chunk_size);
        let target_body = self.entities.try_get(b)?.body();
        let target = target_body.collision_center().canonical(chunk_size);

        let target_rect = {
            let rect = target_body.collision_rect();
            FloatRect::from_size(rect.size()).translated(-rect.half_extents())
        };

        let delta = EntityPosition::distance_in_tiles(&origin, &target, chunk_size);
        for axis_delta in [Vec2::new(0.0, delta.y), Vec2::new(delta.x, 0.0)] {
            let length = axis_delta.length();
            if length >= max_range {
                continue;
            }

            let direction = axis_delta.normalize_or_zero();
            let steps = (length / CARDINAL_SIGHT_STEP) as u32;
            let mut probe = origin;
            for _ in 0..steps {
                probe += direction * CARDINAL_SIGHT_STEP;
                probe.recanonicalize(chunk_size);
                if self.tiles.tile_type(probe.world) == TileType::Wall {
                    break;
                }
                let local = EntityPosition::distance_in_tiles(&target, &probe, chunk_size);
                if target_rect.contains(local) {
                    return Ok(direction);
                }
            }
        }
        Ok(Vec2::ZERO)
    }
}
