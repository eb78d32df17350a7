//! Collision responses and the stock entity behaviors.
//!
//! This module provides:
//! - [`CollisionResponse`]: what a contact does to a body's velocity
//! - [`Particle`]: short-lived debris that bounces off walls
//! - [`Bullet`]: a projectile that bounces a few times and damages what it hits
//! - [`Pickup`]: a loose item that drifts and loses speed on wall bounces
//! - [`Walker`]: an actor steered by an intent direction

use delve_common::EntityPosition;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::Behavior;
use crate::physics::Body;
use crate::rect::CollisionPlane;
use crate::tile_map::Surface;

/// Velocity response to a contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionResponse {
    /// Stop movement on collision
    Stop,
    /// Drop the velocity component into the contact plane
    Slide,
    /// Reflect with coefficient (0.0 = no bounce, 1.0 = full bounce)
    Bounce(f32),
}

impl Default for CollisionResponse {
    fn default() -> Self {
        Self::Slide
    }
}

impl CollisionResponse {
    /// Applies the response to `body` for a contact on `plane`.
    pub fn apply(self, body: &mut Body, plane: CollisionPlane) {
        let velocity = match self {
            Self::Stop => Vec2::ZERO,
            Self::Slide => {
                let mut velocity = body.velocity();
                match plane {
                    CollisionPlane::Vertical => velocity.x = 0.0,
                    CollisionPlane::Horizontal => velocity.y = 0.0,
                    CollisionPlane::Both => velocity = Vec2::ZERO,
                    CollisionPlane::None => {},
                }
                velocity
            },
            Self::Bounce(coefficient) => body.reflected_velocity(plane, coefficient),
        };
        body.set_velocity(velocity);
    }
}

/// Short-lived debris. Ignores other entities and bounces off walls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Seconds until the particle dies
    pub lifetime: f32,
    /// Seconds lived so far
    pub age: f32,
}

impl Particle {
    /// Friction the particle integrates with, whatever the ground.
    pub const FRICTION: f32 = 0.5;

    /// Creates a particle that dies after `lifetime` seconds.
    #[must_use]
    pub const fn new(lifetime: f32) -> Self {
        Self { lifetime, age: 0.0 }
    }

    /// Body for a particle: a small square that collides with its full box.
    #[must_use]
    pub fn body(position: EntityPosition, velocity: Vec2) -> Body {
        Body::new(position, Vec2::splat(0.3))
            .with_full_collision_rect()
            .with_velocity(velocity)
    }
}

impl Behavior for Particle {
    fn name(&self) -> &'static str {
        "particle"
    }

    fn collides_with_entities(&self) -> bool {
        false
    }

    fn update(&mut self, body: &mut Body, dt: f32) {
        self.age += dt;
        if self.age > self.lifetime {
            body.die();
        }
    }

    fn surface(&self, ground: Surface) -> Surface {
        Surface::new(Self::FRICTION, ground.acceleration_modifier)
    }

    fn on_world_collision(&mut self, body: &mut Body, plane: CollisionPlane) {
        CollisionResponse::Bounce(1.0).apply(body, plane);
    }
}

/// Projectile that bounces off walls and damages the first entity it touches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    /// Damage dealt on entity contact
    pub damage: f32,
    /// Wall hits that reflect instead of killing the bullet
    pub bounces_left: u32,
}

impl Bullet {
    /// Friction the bullet integrates with, whatever the ground.
    pub const FRICTION: f32 = 0.001;

    /// Bounces a fresh bullet gets.
    pub const BOUNCES: u32 = 2;

    /// Below this speed the bullet is spent.
    pub const MIN_SPEED: f32 = 1.0;

    /// Fraction of the bullet's velocity passed on as knockback.
    pub const KNOCKBACK: f32 = 0.5;

    /// Creates a bullet with the default number of bounces.
    #[must_use]
    pub const fn new(damage: f32) -> Self {
        Self {
            damage,
            bounces_left: Self::BOUNCES,
        }
    }

    /// Body for a bullet of the given size, colliding with its full box.
    #[must_use]
    pub fn body(position: EntityPosition, velocity: Vec2, size: Vec2) -> Body {
        Body::new(position, size)
            .with_full_collision_rect()
            .with_velocity(velocity)
    }
}

impl Behavior for Bullet {
    fn name(&self) -> &'static str {
        "bullet"
    }

    fn update(&mut self, body: &mut Body, _dt: f32) {
        if body.velocity().length() < Self::MIN_SPEED {
            body.die();
        }
    }

    fn surface(&self, ground: Surface) -> Surface {
        Surface::new(Self::FRICTION, ground.acceleration_modifier)
    }

    fn on_world_collision(&mut self, body: &mut Body, plane: CollisionPlane) {
        if self.bounces_left == 0 {
            body.die();
        } else {
            self.bounces_left -= 1;
        }
        CollisionResponse::Bounce(1.0).apply(body, plane);
    }

    fn on_entity_collision(&mut self, body: &mut Body, plane: CollisionPlane, other: &mut Body) {
        other.add_health(-self.damage);
        other.add_velocity(body.velocity() * Self::KNOCKBACK);
        CollisionResponse::Bounce(1.0).apply(body, plane);
        debug!("Bullet hit for {} damage", self.damage);
        body.die();
    }
}

/// Loose item dropped into the world. Other entities pass through it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    /// Value collected by whoever picks it up
    pub amount: f32,
}

impl Pickup {
    /// Friction the pickup integrates with, whatever the ground.
    pub const FRICTION: f32 = 0.5;

    /// Share of the velocity kept on a wall bounce.
    pub const RESTITUTION: f32 = 0.5;

    /// Amount that maps to a one-tile body.
    pub const AMOUNT_PER_TILE: f32 = 70.0;

    /// Creates a pickup worth `amount`.
    #[must_use]
    pub const fn new(amount: f32) -> Self {
        Self { amount }
    }

    /// Body for a pickup; its side grows with the amount.
    #[must_use]
    pub fn body(position: EntityPosition, velocity: Vec2, amount: f32) -> Body {
        Body::new(position, Vec2::splat(amount / Self::AMOUNT_PER_TILE))
            .with_full_collision_rect()
            .with_velocity(velocity)
    }
}

impl Behavior for Pickup {
    fn name(&self) -> &'static str {
        "pickup"
    }

    fn collides_with_entities(&self) -> bool {
        false
    }

    fn surface(&self, ground: Surface) -> Surface {
        Surface::new(Self::FRICTION, ground.acceleration_modifier)
    }

    fn on_world_collision(&mut self, body: &mut Body, plane: CollisionPlane) {
        CollisionResponse::Bounce(Self::RESTITUTION).apply(body, plane);
    }
}

/// Actor that accelerates along an intent direction every tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Walker {
    /// Direction of travel; the integrator applies the magnitude
    pub intent: Vec2,
    /// Response on any contact
    pub response: CollisionResponse,
}

impl Walker {
    /// Creates a walker heading along `intent` that slides along obstacles.
    #[must_use]
    pub fn new(intent: Vec2) -> Self {
        Self {
            intent,
            response: CollisionResponse::Slide,
        }
    }

    /// Replaces the contact response.
    #[must_use]
    pub const fn with_response(mut self, response: CollisionResponse) -> Self {
        self.response = response;
        self
    }
}

impl Behavior for Walker {
    fn name(&self) -> &'static str {
        "walker"
    }

    fn update(&mut self, body: &mut Body, _dt: f32) {
        body.add_acceleration(self.intent);
    }

    fn on_world_collision(&mut self, body: &mut Body, plane: CollisionPlane) {
        self.response.apply(body, plane);
    }

    fn on_entity_collision(&mut self, body: &mut Body, plane: CollisionPlane, _other: &mut Body) {
        self.response.apply(body, plane);
    }
}
