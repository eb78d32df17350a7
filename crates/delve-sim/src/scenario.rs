//! The smoke-run room and its population.

use std::f32::consts::TAU;

use anyhow::Result;
use delve_common::{EntityPosition, WorldPosition};
use delve_gameplay::{Body, Bullet, Entity, Level, Particle, PhysicsConfig, TileType, Walker};
use glam::{IVec2, Vec2};
use tracing::{debug, info};

/// Room size in tiles, walls included.
const ROOM_SIZE: IVec2 = IVec2::new(30, 12);

const BULLET_COUNT: usize = 8;
const PARTICLE_COUNT: usize = 20;

fn at(tile: IVec2, offset: Vec2) -> EntityPosition {
    EntityPosition::from_tile(tile, offset)
}

/// Builds the room and queues its entities.
///
/// The room has an ice patch straddling the first chunk border and a strip of
/// speed ground along the bottom.
pub fn build(config: &PhysicsConfig, seed: u64) -> Result<Level> {
    let mut map = config.map_builder().room(WorldPosition::default(), ROOM_SIZE);

    let border = config.chunk_size.x;
    map.fill_rect(
        WorldPosition::from_tile(IVec2::new(border - 4, 3)),
        IVec2::new(8, 4),
        TileType::StoneIceGround,
    );
    map.fill_rect(
        WorldPosition::from_tile(IVec2::new(2, ROOM_SIZE.y - 3)),
        IVec2::new(ROOM_SIZE.x - 4, 1),
        TileType::StoneSpeedGround,
    );

    let mut level = Level::new(map, *config);
    let mut rng = fastrand::Rng::with_seed(seed);

    let patrol = Body::new(at(IVec2::new(3, 4), Vec2::ZERO), Vec2::new(0.8, 1.0)).with_health(100.0);
    level.spawn(Entity::new(patrol, Walker::new(Vec2::X)))?;

    for row in [2, 5, 8] {
        let target = Body::new(at(IVec2::new(ROOM_SIZE.x - 5, row), Vec2::ZERO), Vec2::new(0.8, 1.0))
            .with_health(60.0);
        level.spawn(Entity::new(target, Walker::default()))?;
    }

    for i in 0..BULLET_COUNT {
        let angle = rng.f32() * TAU;
        let speed = 15.0 + rng.f32() * 10.0;
        let position = at(IVec2::new(4 + 2 * i as i32, 9), Vec2::splat(0.35));
        let body = Bullet::body(position, Vec2::from_angle(angle) * speed, Vec2::splat(0.3));
        level.spawn(Entity::new(body, Bullet::new(20.0)))?;
    }

    let burst = at(IVec2::new(border, 6), Vec2::splat(0.35));
    for _ in 0..PARTICLE_COUNT {
        let velocity = Vec2::from_angle(rng.f32() * TAU) * (2.0 + rng.f32() * 6.0);
        let lifetime = 1.0 + rng.f32() * 4.0;
        level.spawn(Entity::new(Particle::body(burst, velocity), Particle::new(lifetime)))?;
    }

    info!(
        "Scenario ready: {} entities queued",
        level.entities().pending_len()
    );
    Ok(level)
}

/// Logs where every surviving entity ended up.
pub fn report(level: &Level) {
    let origin = EntityPosition::default();
    let chunk_size = level.chunk_size();
    for (handle, entity) in level.entities().iter() {
        let body = entity.body();
        let place = EntityPosition::distance_in_tiles(&origin, body.position(), chunk_size);
        match body.health() {
            Some(health) => info!(
                "{} {} at ({:.2}, {:.2}) with {:.0}/{:.0} health",
                entity.behavior().name(),
                handle,
                place.x,
                place.y,
                health.current(),
                health.max()
            ),
            None => debug!(
                "{} {} at ({:.2}, {:.2})",
                entity.behavior().name(),
                handle,
                place.x,
                place.y
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_spawns_everything() {
        let level = build(&PhysicsConfig::default(), 7).expect("scenario builds");
        assert_eq!(
            level.entities().pending_len(),
            1 + 3 + BULLET_COUNT + PARTICLE_COUNT
        );
    }

    #[test]
    fn test_scenario_runs_without_overlaps() {
        let mut level = build(&PhysicsConfig::default(), 7).expect("scenario builds");

        let mut killed = 0;
        for _ in 0..300 {
            killed += level.tick(1.0 / 60.0).killed_overlapping;
        }
        assert_eq!(killed, 0);

        for (handle, entity) in level.entities().iter() {
            assert!(!level.is_colliding_with_level(entity.body(), false, Some(handle)));
        }
    }
}
