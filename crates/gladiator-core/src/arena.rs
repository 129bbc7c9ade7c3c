//! Arena module: the live-entity registry.
//!
//! The Arena owns every gladiator and effect of the current match. It
//! provides:
//! - Storage with deterministic iteration order (`BTreeMap`)
//! - One monotonic id space shared by gladiators and effects
//! - Lookups used to resolve the id-based references entities hold
//!
//! # Weak References
//!
//! Entities refer to each other only by [`EntityId`]. Resolving an id that
//! has been despawned yields `None`, and because ids are never reused (not
//! even after [`Arena::clear`]) a stale id can never resolve to a different
//! entity.
//!
//! # Example
//!
//! ```
//! use gladiator_core::arena::Arena;
//! use gladiator_core::entity::{AgentStats, Gladiator};
//! use glam::Vec2;
//!
//! let mut arena = Arena::new();
//! let stats = AgentStats::from_attributes(10.0, 150.0, 2.0, 2.0, 0.5, 0.1);
//! let id = arena.spawn_gladiator(|id| Gladiator::new(id, stats, Vec2::ZERO, 1000));
//!
//! assert!(arena.gladiator(id).is_some());
//! arena.despawn_gladiator(id);
//! assert!(arena.gladiator(id).is_none());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::effects::Effect;
use crate::entity::{EntityId, Gladiator};

/// Container of all gladiators and effects in play.
///
/// Iteration is always in ascending id order, so "first encountered" means
/// "lowest id".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    /// Monotonically increasing id counter.
    next_id: u64,
    gladiators: BTreeMap<EntityId, Gladiator>,
    effects: BTreeMap<EntityId, Effect>,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    // -------------------------------------------------------------------------
    // Gladiators
    // -------------------------------------------------------------------------

    /// Allocates an id and inserts the gladiator built from it.
    pub fn spawn_gladiator(&mut self, build: impl FnOnce(EntityId) -> Gladiator) -> EntityId {
        let id = self.allocate();
        self.gladiators.insert(id, build(id));
        id
    }

    /// Removes a gladiator, returning it if it existed.
    pub fn despawn_gladiator(&mut self, id: EntityId) -> Option<Gladiator> {
        self.gladiators.remove(&id)
    }

    /// Looks up a gladiator.
    #[must_use]
    pub fn gladiator(&self, id: EntityId) -> Option<&Gladiator> {
        self.gladiators.get(&id)
    }

    /// Looks up a gladiator mutably.
    #[must_use]
    pub fn gladiator_mut(&mut self, id: EntityId) -> Option<&mut Gladiator> {
        self.gladiators.get_mut(&id)
    }

    /// Looks up a gladiator that has not been knocked out.
    #[must_use]
    pub fn active_gladiator(&self, id: EntityId) -> Option<&Gladiator> {
        self.gladiators.get(&id).filter(|g| g.is_active())
    }

    /// Looks up a gladiator that has not been knocked out, mutably.
    #[must_use]
    pub fn active_gladiator_mut(&mut self, id: EntityId) -> Option<&mut Gladiator> {
        self.gladiators.get_mut(&id).filter(|g| g.is_active())
    }

    /// All gladiators in id order, including knocked-out ones awaiting removal.
    pub fn gladiators(&self) -> impl Iterator<Item = &Gladiator> + '_ {
        self.gladiators.values()
    }

    /// All gladiators in id order, mutably.
    pub fn gladiators_mut(&mut self) -> impl Iterator<Item = &mut Gladiator> + '_ {
        self.gladiators.values_mut()
    }

    /// Gladiators still fighting, in id order.
    pub fn active_gladiators(&self) -> impl Iterator<Item = &Gladiator> + '_ {
        self.gladiators.values().filter(|g| g.is_active())
    }

    /// Ids of gladiators still fighting, in id order.
    #[must_use]
    pub fn active_ids(&self) -> Vec<EntityId> {
        self.active_gladiators().map(Gladiator::id).collect()
    }

    /// Number of gladiators still fighting.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_gladiators().count()
    }

    /// Number of gladiators present, knocked out or not.
    #[must_use]
    pub fn gladiator_count(&self) -> usize {
        self.gladiators.len()
    }

    // -------------------------------------------------------------------------
    // Effects
    // -------------------------------------------------------------------------

    /// Allocates an id and inserts the effect built from it.
    pub fn spawn_effect(&mut self, build: impl FnOnce(EntityId) -> Effect) -> EntityId {
        let id = self.allocate();
        self.effects.insert(id, build(id));
        id
    }

    /// Removes an effect, returning it if it existed.
    pub fn despawn_effect(&mut self, id: EntityId) -> Option<Effect> {
        self.effects.remove(&id)
    }

    /// Looks up an effect.
    #[must_use]
    pub fn effect(&self, id: EntityId) -> Option<&Effect> {
        self.effects.get(&id)
    }

    /// All effects in id order.
    pub fn effects(&self) -> impl Iterator<Item = &Effect> + '_ {
        self.effects.values()
    }

    /// All effects in id order, mutably.
    pub fn effects_mut(&mut self) -> impl Iterator<Item = &mut Effect> + '_ {
        self.effects.values_mut()
    }

    /// Power-ups currently on the field.
    pub fn power_ups(&self) -> impl Iterator<Item = &Effect> + '_ {
        self.effects.values().filter(|e| e.is_power_up())
    }

    /// Number of effects present.
    #[must_use]
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Returns true if the id resolves to any entity.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.gladiators.contains_key(&id) || self.effects.contains_key(&id)
    }

    /// Drops every entity. The id counter keeps running.
    pub fn clear(&mut self) {
        self.gladiators.clear();
        self.effects.clear();
    }

    /// Returns true if nothing is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gladiators.is_empty() && self.effects.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
