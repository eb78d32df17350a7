//! Kinetic body state and the per-tick integrator.
//!
//! Every moving archetype (player, monsters, bullets, particles, pickups)
//! shares [`Body`]. The integrator turns the body's velocity and its
//! accumulated acceleration into a displacement for this tick; it never moves
//! the body itself. Collision resolution decides how much of that
//! displacement is actually applied.

use delve_common::EntityPosition;
use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::rect::{CollisionPlane, FloatRect};

/// Per-axis velocity limit in tiles per second.
pub const VELOCITY_CLAMP: f32 = 5000.0;

/// Default acceleration magnitude in tiles per second squared.
pub const DEFAULT_ACCELERATION_SCALE: f32 = 25.0;

/// Fraction of the sprite box, from the bottom, used for collision by default.
const DEFAULT_COLLISION_FRACTION: f32 = 0.3;

/// Health component for bodies that can take damage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Current health
    current: f32,
    /// Maximum health
    max: f32,
}

impl Health {
    /// Creates a new health component at full health.
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Returns current health.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Returns maximum health.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Adds `amount` (negative for damage), clamped to `[0, max]`.
    pub fn add(&mut self, amount: f32) {
        self.current = (self.current + amount).clamp(0.0, self.max);
    }

    /// Checks if dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

/// Shared state of every kinetic entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Top-left anchor of the sprite box
    position: EntityPosition,
    /// Sprite box size in tiles
    dimensions: Vec2,
    /// Collision rectangle relative to `position` (top-left anchored)
    collision_rect: FloatRect,
    /// Velocity in tiles per second
    velocity: Vec2,
    /// Tick-scoped acceleration input, drained by every integration step
    acceleration: Vec2,
    /// Base acceleration magnitude
    acceleration_scale: f32,
    /// Optional health pool
    health: Option<Health>,
    /// Cleared when the body dies; the arena sweeps it at the end of the tick
    alive: bool,
}

impl Body {
    /// Creates a body at `position` with the given sprite size.
    ///
    /// The collision rectangle defaults to the bottom 30% of the sprite box.
    #[must_use]
    pub fn new(position: EntityPosition, dimensions: Vec2) -> Self {
        let collision_height = dimensions.y * DEFAULT_COLLISION_FRACTION;
        Self {
            position,
            dimensions,
            collision_rect: FloatRect::new(
                0.0,
                dimensions.y - collision_height,
                dimensions.x,
                collision_height,
            ),
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            acceleration_scale: DEFAULT_ACCELERATION_SCALE,
            health: None,
            alive: true,
        }
    }

    /// Replaces the collision rectangle.
    #[must_use]
    pub fn with_collision_rect(mut self, rect: FloatRect) -> Self {
        self.collision_rect = rect;
        self
    }

    /// Uses the whole sprite box for collision.
    #[must_use]
    pub fn with_full_collision_rect(mut self) -> Self {
        self.collision_rect = FloatRect::from_size(self.dimensions);
        self
    }

    /// Sets the initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the acceleration scale.
    #[must_use]
    pub fn with_acceleration_scale(mut self, scale: f32) -> Self {
        self.acceleration_scale = scale;
        self
    }

    /// Gives the body a health pool.
    #[must_use]
    pub fn with_health(mut self, max: f32) -> Self {
        self.health = Some(Health::new(max));
        self
    }

    /// Returns the position.
    #[must_use]
    pub const fn position(&self) -> &EntityPosition {
        &self.position
    }

    /// Sets the position.
    pub fn set_position(&mut self, position: EntityPosition) {
        self.position = position;
    }

    /// Returns the sprite size.
    #[must_use]
    pub const fn dimensions(&self) -> Vec2 {
        self.dimensions
    }

    /// Returns the collision rectangle in body-local space.
    #[must_use]
    pub const fn collision_rect(&self) -> FloatRect {
        self.collision_rect
    }

    /// Returns the velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Replaces the velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Adds to the velocity (knockback, pushes).
    pub fn add_velocity(&mut self, velocity: Vec2) {
        self.velocity += velocity;
    }

    /// Returns the acceleration accumulated so far this tick.
    #[must_use]
    pub const fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    /// Accumulates acceleration input for this tick.
    ///
    /// Input is a direction; its magnitude is applied by the integrator.
    pub fn add_acceleration(&mut self, acceleration: Vec2) {
        self.acceleration += acceleration;
    }

    /// Returns the acceleration scale.
    #[must_use]
    pub const fn acceleration_scale(&self) -> f32 {
        self.acceleration_scale
    }

    /// Returns the health pool, if any.
    #[must_use]
    pub const fn health(&self) -> Option<&Health> {
        self.health.as_ref()
    }

    /// Adds health (negative for damage). A drained pool kills the body.
    pub fn add_health(&mut self, amount: f32) {
        if let Some(health) = self.health.as_mut() {
            health.add(amount);
            if health.is_dead() {
                self.die();
            }
        }
    }

    /// Returns whether the body is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Marks the body dead. Removal happens at the end of the tick.
    pub fn die(&mut self) {
        self.alive = false;
    }

    /// Center of the collision rectangle relative to `position`.
    #[must_use]
    pub fn local_collision_center(&self) -> Vec2 {
        self.collision_rect.center()
    }

    /// Center of the collision rectangle in world space (not canonical).
    #[must_use]
    pub fn collision_center(&self) -> EntityPosition {
        self.position + self.local_collision_center()
    }

    /// Velocity mirrored across `plane`, scaled by `speed_factor`.
    #[must_use]
    pub fn reflected_velocity(&self, plane: CollisionPlane, speed_factor: f32) -> Vec2 {
        let mut reflected = self.velocity;
        match plane {
            CollisionPlane::Vertical => reflected.x *= -speed_factor,
            CollisionPlane::Horizontal => reflected.y *= -speed_factor,
            CollisionPlane::Both => reflected *= -speed_factor,
            CollisionPlane::None => {},
        }
        reflected
    }

    /// Integrates one tick and returns the intended displacement.
    ///
    /// Same as [`position_delta_with_modifier`](Self::position_delta_with_modifier)
    /// with an acceleration modifier of 1.
    pub fn position_delta(&mut self, dt: f32, friction: f32) -> Vec2 {
        self.position_delta_with_modifier(dt, friction, 1.0)
    }

    /// Integrates one tick and returns the intended displacement.
    ///
    /// Diagonal input is normalized so it is not faster than straight input.
    /// Displacement uses the velocity from before this step. Velocity is then
    /// updated, clamped per axis to [`VELOCITY_CLAMP`] and decayed by
    /// `friction` (1.0 decays it to zero over one second). The accumulated
    /// acceleration is drained.
    pub fn position_delta_with_modifier(
        &mut self,
        dt: f32,
        friction: f32,
        acceleration_modifier: f32,
    ) -> Vec2 {
        let mut acceleration = self.acceleration;
        if acceleration.x != 0.0 && acceleration.y != 0.0 {
            acceleration *= std::f32::consts::FRAC_1_SQRT_2;
        }
        acceleration *= self.acceleration_scale * acceleration_modifier;

        let displacement = acceleration * 0.5 * (dt * dt) + self.velocity * dt;

        self.velocity += acceleration * dt;
        self.velocity = self
            .velocity
            .clamp(Vec2::splat(-VELOCITY_CLAMP), Vec2::splat(VELOCITY_CLAMP));
        self.velocity -= self.velocity * friction * dt;

        self.acceleration = Vec2::ZERO;
        displacement
    }

    /// Moves the body by `displacement` and canonicalizes its position.
    pub fn advance(&mut self, displacement: Vec2, chunk_size: IVec2) {
        self.position += displacement;
        self.position.recanonicalize(chunk_size);
    }
}
