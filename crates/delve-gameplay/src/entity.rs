//! Entity storage with deferred insertion and removal.
//!
//! An [`Entity`] is a [`Body`] plus a boxed [`Behavior`] that supplies the
//! kind-specific reactions. Entities live in an [`EntityArena`] addressed by
//! generational [`EntityHandle`]s.
//!
//! The arena is never structurally modified while a tick is iterating it:
//! - spawned entities are queued as pending and become live on the next
//!   [`flush_pending`](EntityArena::flush_pending)
//! - dying only clears the body's alive flag; dead entities stay in place until
//!   [`sweep_dead`](EntityArena::sweep_dead)

use std::fmt;

use delve_common::{EntityHandle, EntityPosition};
use glam::Vec2;
use thiserror::Error;
use tracing::debug;

use crate::physics::Body;
use crate::rect::CollisionPlane;
use crate::tile_map::Surface;

/// Error types for entity operations.
#[derive(Debug, Error)]
pub enum EntityError {
    /// Handle does not refer to a live entity
    #[error("Entity not found: {0}")]
    NotFound(EntityHandle),
    /// Spawn position overlaps terrain or another entity
    #[error("Spawn position is obstructed at {0:?}")]
    Obstructed(EntityPosition),
}

/// Result type for entity operations.
pub type EntityResult<T> = Result<T, EntityError>;

/// Kind-specific behavior plugged into the movement core.
///
/// Reactions may change velocity, health or the alive flag of the bodies they
/// are given. They must not spawn into or remove from the arena directly and
/// must not run collision checks themselves.
pub trait Behavior: fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this entity takes part in entity-vs-entity collision.
    fn collides_with_entities(&self) -> bool {
        true
    }

    /// Called once per tick before integration. Add acceleration here.
    fn update(&mut self, _body: &mut Body, _dt: f32) {}

    /// Friction and acceleration modifier to integrate with, given the
    /// surface under the entity.
    fn surface(&self, ground: Surface) -> Surface {
        ground
    }

    /// The entity ran into a blocking tile.
    fn on_world_collision(&mut self, _body: &mut Body, _plane: CollisionPlane) {}

    /// The entity touched `other`, either as the mover or as the one struck.
    fn on_entity_collision(&mut self, _body: &mut Body, _plane: CollisionPlane, _other: &mut Body) {
    }
}

/// A body and its behavior.
#[derive(Debug)]
pub struct Entity {
    body: Body,
    behavior: Box<dyn Behavior>,
}

impl Entity {
    /// Creates a new entity.
    #[must_use]
    pub fn new(body: Body, behavior: impl Behavior + 'static) -> Self {
        Self {
            body,
            behavior: Box::new(behavior),
        }
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Returns the body mutably.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Returns the behavior.
    #[must_use]
    pub fn behavior(&self) -> &dyn Behavior {
        self.behavior.as_ref()
    }

    /// Borrows body and behavior at the same time.
    pub fn split_mut(&mut self) -> (&mut Body, &mut dyn Behavior) {
        (&mut self.body, self.behavior.as_mut())
    }

    /// Whether the entity is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.body.is_alive()
    }

    /// Whether the entity takes part in entity-vs-entity collision.
    #[must_use]
    pub fn collides_with_entities(&self) -> bool {
        self.behavior.collides_with_entities()
    }

    /// Convenience accessor for the body's velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.body.velocity()
    }
}

/// State of one arena slot.
#[derive(Debug)]
enum Slot {
    /// Free for reuse
    Vacant,
    /// Spawned this tick, not yet visible to iteration
    Pending(Entity),
    /// Visible to iteration and collision
    Live(Entity),
}

#[derive(Debug)]
struct SlotEntry {
    generation: u32,
    slot: Slot,
}

/// Arena-based entity storage with deferred insertion and removal.
///
/// Uses a free list for slot reuse. Reused slots get a new generation so stale
/// handles never resolve to the new occupant.
#[derive(Debug, Default)]
pub struct EntityArena {
    entries: Vec<SlotEntry>,
    free_list: Vec<usize>,
    pending: Vec<usize>,
}

impl EntityArena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.slot, Slot::Live(_)))
            .count()
    }

    /// Returns true if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of entities waiting for the next flush.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn allocate(&mut self, slot: Slot) -> EntityHandle {
        if let Some(index) = self.free_list.pop() {
            let entry = &mut self.entries[index];
            entry.slot = slot;
            EntityHandle::new(index as u32, entry.generation)
        } else {
            let index = self.entries.len();
            self.entries.push(SlotEntry {
                generation: 0,
                slot,
            });
            EntityHandle::new(index as u32, 0)
        }
    }

    /// Queues an entity; it becomes live on the next flush.
    pub fn insert_pending(&mut self, entity: Entity) -> EntityHandle {
        let handle = self.allocate(Slot::Pending(entity));
        self.pending.push(handle.index());
        handle
    }

    /// Inserts an entity that is live immediately.
    ///
    /// Only for setup outside of a tick.
    pub fn insert(&mut self, entity: Entity) -> EntityHandle {
        self.allocate(Slot::Live(entity))
    }

    /// Makes every pending entity live. Returns how many were flushed.
    pub fn flush_pending(&mut self) -> usize {
        let count = self.pending.len();
        for index in self.pending.drain(..) {
            let entry = &mut self.entries[index];
            entry.slot = match std::mem::replace(&mut entry.slot, Slot::Vacant) {
                Slot::Pending(entity) => {
                    debug!(
                        "Registered {} as {}",
                        entity.behavior().name(),
                        EntityHandle::new(index as u32, entry.generation)
                    );
                    Slot::Live(entity)
                },
                other => other,
            };
        }
        count
    }

    /// Removes every dead live entity. Returns the removed handles.
    pub fn sweep_dead(&mut self) -> Vec<EntityHandle> {
        let mut removed = Vec::new();
        for (index, entry) in self.entries.iter_mut().enumerate() {
            let dead = matches!(&entry.slot, Slot::Live(entity) if !entity.is_alive());
            if dead {
                let handle = EntityHandle::new(index as u32, entry.generation);
                if let Slot::Live(entity) = std::mem::replace(&mut entry.slot, Slot::Vacant) {
                    debug!("Removed {} {}", entity.behavior().name(), handle);
                }
                entry.generation = entry.generation.wrapping_add(1);
                self.free_list.push(index);
                removed.push(handle);
            }
        }
        removed
    }

    fn entry(&self, handle: EntityHandle) -> Option<&SlotEntry> {
        self.entries
            .get(handle.index())
            .filter(|entry| entry.generation == handle.generation())
    }

    /// Returns true if the handle refers to a live entity slot.
    ///
    /// The entity may already be marked dead this tick.
    #[must_use]
    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Returns true if the handle refers to a live slot whose body is alive.
    #[must_use]
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.get(handle).is_some_and(Entity::is_alive)
    }

    /// Returns a live entity.
    #[must_use]
    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        match &self.entry(handle)?.slot {
            Slot::Live(entity) => Some(entity),
            _ => None,
        }
    }

    /// Returns a live entity mutably.
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        let entry = self
            .entries
            .get_mut(handle.index())
            .filter(|entry| entry.generation == handle.generation())?;
        match &mut entry.slot {
            Slot::Live(entity) => Some(entity),
            _ => None,
        }
    }

    /// Returns a live entity or [`EntityError::NotFound`].
    pub fn try_get(&self, handle: EntityHandle) -> EntityResult<&Entity> {
        self.get(handle).ok_or(EntityError::NotFound(handle))
    }

    /// Returns two distinct live entities mutably.
    pub fn get_pair_mut(
        &mut self,
        a: EntityHandle,
        b: EntityHandle,
    ) -> Option<(&mut Entity, &mut Entity)> {
        if a.index() == b.index() {
            return None;
        }
        self.entry(a)?;
        self.entry(b)?;

        let (low, high, swapped) = if a.index() < b.index() {
            (a.index(), b.index(), false)
        } else {
            (b.index(), a.index(), true)
        };
        let (head, tail) = self.entries.split_at_mut(high);
        let first = match &mut head[low].slot {
            Slot::Live(entity) => entity,
            _ => return None,
        };
        let second = match &mut tail[0].slot {
            Slot::Live(entity) => entity,
            _ => return None,
        };
        Some(if swapped { (second, first) } else { (first, second) })
    }

    /// Iterates live entities (including ones marked dead this tick).
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &Entity)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match &entry.slot {
                Slot::Live(entity) => Some((EntityHandle::new(index as u32, entry.generation), entity)),
                _ => None,
            })
    }

    /// Snapshot of live handles, in slot order.
    #[must_use]
    pub fn handles(&self) -> Vec<EntityHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}
