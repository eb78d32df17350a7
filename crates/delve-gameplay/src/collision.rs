//! Swept collision against terrain and other entities.
//!
//! Every check works in the mover's local frame: positions of tiles and other
//! entities are turned into tile-unit offsets from the mover's base position
//! with [`EntityPosition::distance_in_tiles`], so chunk boundaries never show
//! up in the geometry. The mover is reduced to the center of its collision
//! rectangle and obstacles are grown by its half-extents.
//!
//! The result of a check is a fraction `t` of the requested displacement that
//! can be applied safely, plus the plane that was hit.

use delve_common::{EntityHandle, EntityPosition, WorldPosition};
use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::entity::EntityArena;
use crate::physics::Body;
use crate::rect::{CollisionPlane, FloatRect, RectEdge};
use crate::tile_map::TileLookup;

/// Input to a collision query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionCheckData {
    /// Mover's anchor position
    pub base_position: EntityPosition,
    /// Mover's collision rectangle relative to `base_position`
    pub collision_rect: FloatRect,
    /// Requested displacement in tiles
    pub delta: Vec2,
}

impl CollisionCheckData {
    /// Creates a new query.
    #[must_use]
    pub const fn new(base_position: EntityPosition, collision_rect: FloatRect, delta: Vec2) -> Self {
        Self {
            base_position,
            collision_rect,
            delta,
        }
    }

    /// Query for moving `body` by `delta`.
    #[must_use]
    pub fn for_body(body: &Body, delta: Vec2) -> Self {
        Self::new(*body.position(), body.collision_rect(), delta)
    }

    fn mover_point(&self) -> Vec2 {
        self.collision_rect.center()
    }
}

/// Outcome of a terrain check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldCollisionResult {
    /// Fraction of the displacement that can be applied, in `[0, 1]`
    pub max_allowed_t: f32,
    /// Plane of the earliest hit
    pub plane: CollisionPlane,
}

impl Default for WorldCollisionResult {
    fn default() -> Self {
        Self {
            max_allowed_t: 1.0,
            plane: CollisionPlane::None,
        }
    }
}

impl WorldCollisionResult {
    /// Returns true if the full displacement is not allowed.
    #[must_use]
    pub fn is_collision(&self) -> bool {
        self.max_allowed_t != 1.0
    }
}

/// Outcome of an entity check, or of a combined check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityCollisionResult {
    /// Fraction of the displacement that can be applied, in `[0, 1]`
    pub max_allowed_t: f32,
    /// Plane of the earliest hit
    pub plane: CollisionPlane,
    /// Entity that was hit; `None` for terrain hits and no hit
    pub collided_entity: Option<EntityHandle>,
}

impl Default for EntityCollisionResult {
    fn default() -> Self {
        Self {
            max_allowed_t: 1.0,
            plane: CollisionPlane::None,
            collided_entity: None,
        }
    }
}

impl EntityCollisionResult {
    /// Returns true if the full displacement is not allowed.
    #[must_use]
    pub fn is_collision(&self) -> bool {
        self.max_allowed_t != 1.0
    }
}

impl From<WorldCollisionResult> for EntityCollisionResult {
    fn from(result: WorldCollisionResult) -> Self {
        Self {
            max_allowed_t: result.max_allowed_t,
            plane: result.plane,
            collided_entity: None,
        }
    }
}

/// Distances that tune collision resolution, in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTolerances {
    /// Gap kept between a mover and terrain after a hit
    pub terrain_epsilon: f32,
    /// Gap kept between a mover and another entity after a hit
    pub entity_epsilon: f32,
    /// Entities farther than this (plus the displacement length) are skipped
    pub entity_cull_radius: f32,
}

impl Default for CollisionTolerances {
    fn default() -> Self {
        Self {
            terrain_epsilon: 0.01,
            entity_epsilon: 0.1,
            entity_cull_radius: 4.0,
        }
    }
}

/// Tiles the mover's collision rectangle may touch along `data.delta`.
///
/// Covers every tile between the rectangle's trailing corner at the start and
/// its leading corner at the end of the motion, both ends included. A zero
/// component of `delta` is treated as positive, so a zero displacement yields
/// the tiles under the rectangle itself. Returned positions are canonical.
#[must_use]
pub fn affected_tiles(data: &CollisionCheckData, chunk_size: IVec2) -> Vec<WorldPosition> {
    let rect = data.collision_rect;
    let mut start = data.base_position + rect.top_left();
    let mut end = start + data.delta;

    if data.delta.x >= 0.0 {
        end += Vec2::new(rect.width, 0.0);
    } else {
        start += Vec2::new(rect.width, 0.0);
    }
    if data.delta.y >= 0.0 {
        end += Vec2::new(0.0, rect.height);
    } else {
        start += Vec2::new(0.0, rect.height);
    }

    start.recanonicalize(chunk_size);
    end.recanonicalize(chunk_size);

    let span = WorldPosition::distance_in_tiles_inclusive(&start.world, &end.world, chunk_size);
    let (min, max) = (span.min(IVec2::ZERO), span.max(IVec2::ZERO));

    let capacity = ((max.x - min.x + 1) * (max.y - min.y + 1)) as usize;
    let mut tiles = Vec::with_capacity(capacity);
    for y in min.y..=max.y {
        for x in min.x..=max.x {
            tiles.push((start.world + IVec2::new(x, y)).canonical(chunk_size));
        }
    }
    tiles
}

/// Earliest wall hit among `tiles` for the mover described by `data`.
///
/// Only tiles whose type blocks movement are considered. Hits at exactly
/// `t = 1` are not collisions.
pub fn check_collisions_with_tiles<L>(
    tiles: &[WorldPosition],
    data: &CollisionCheckData,
    lookup: &L,
) -> WorldCollisionResult
where
    L: TileLookup + ?Sized,
{
    let chunk_size = lookup.chunk_size();
    let point = data.mover_point();
    let mut result = WorldCollisionResult::default();

    for &tile in tiles {
        if !lookup.tile_type(tile).is_blocking() {
            continue;
        }
        let local =
            EntityPosition::distance_in_tiles(&data.base_position, &EntityPosition::from(tile), chunk_size);
        let grown = FloatRect::new(local.x, local.y, 1.0, 1.0).minkowski_sum(&data.collision_rect);

        for edge in RectEdge::ALL {
            if let Some(t) = grown.max_time(point, data.delta, edge) {
                if t < result.max_allowed_t {
                    result.max_allowed_t = t;
                    result.plane = edge.plane();
                }
            }
        }
    }
    result
}

/// Terrain check for a whole displacement.
pub fn check_world_collision<L>(data: &CollisionCheckData, lookup: &L) -> WorldCollisionResult
where
    L: TileLookup + ?Sized,
{
    let tiles = affected_tiles(data, lookup.chunk_size());
    let result = check_collisions_with_tiles(&tiles, data, lookup);
    trace!(
        "World check over {} tiles: t = {}, plane = {:?}",
        tiles.len(),
        result.max_allowed_t,
        result.plane
    );
    result
}

/// Earliest hit against other live entities.
///
/// Skips `mover` itself, dead entities, and entities that opt out of entity
/// collision. Candidates whose grown rectangle lies farther from the mover's
/// collision center than `cull_radius` plus the displacement length are
/// skipped. Only hits with `t >= 0` count.
#[must_use]
pub fn check_entity_collision(
    mover: Option<EntityHandle>,
    data: &CollisionCheckData,
    arena: &EntityArena,
    chunk_size: IVec2,
    cull_radius: f32,
) -> EntityCollisionResult {
    let point = data.mover_point();
    let reach = cull_radius + data.delta.length();
    let mut result = EntityCollisionResult::default();

    for (handle, entity) in arena.iter() {
        if Some(handle) == mover || !entity.is_alive() || !entity.collides_with_entities() {
            continue;
        }

        let body = entity.body();
        let local = EntityPosition::distance_in_tiles(&data.base_position, body.position(), chunk_size);
        let grown = body
            .collision_rect()
            .translated(local)
            .minkowski_sum(&data.collision_rect);

        let nearest = point.clamp(grown.top_left(), grown.top_left() + grown.size());
        if point.distance(nearest) > reach {
            continue;
        }

        for edge in RectEdge::ALL {
            if let Some(t) = grown.max_time(point, data.delta, edge) {
                if t >= 0.0 && t < result.max_allowed_t {
                    result.max_allowed_t = t;
                    result.plane = edge.plane();
                    result.collided_entity = Some(handle);
                }
            }
        }
    }

    if let Some(handle) = result.collided_entity {
        trace!("Entity check hit {} at t = {}", handle, result.max_allowed_t);
    }
    result
}

/// Combines a terrain and an entity result into the final answer.
///
/// No collision when both allow the full displacement. Otherwise the earlier
/// hit wins, with ties going to the entity, and `t` is pulled back so the
/// mover stops `epsilon` tiles short of the obstacle (terrain or entity
/// epsilon from `tolerances`). A pull-back that would make `t` negative, or a
/// displacement shorter than the epsilon, gives `t = 0`.
#[must_use]
pub fn arbitrate(
    world: WorldCollisionResult,
    entity: EntityCollisionResult,
    delta: Vec2,
    tolerances: &CollisionTolerances,
) -> EntityCollisionResult {
    if !world.is_collision() && !entity.is_collision() {
        return EntityCollisionResult::default();
    }

    let (mut result, epsilon) = if world.max_allowed_t < entity.max_allowed_t {
        (EntityCollisionResult::from(world), tolerances.terrain_epsilon)
    } else {
        (entity, tolerances.entity_epsilon)
    };

    let pull_back = epsilon / delta.length();
    result.max_allowed_t = if pull_back < 1.0 {
        (result.max_allowed_t - pull_back).max(0.0)
    } else {
        0.0
    };
    result
}
