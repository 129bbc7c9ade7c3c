//! Entity module: identifiers, stat blocks and gladiators.
//!
//! - [`EntityId`]: unique identifier for gladiators and effects
//! - [`stats`]: the stat block, the stat generator and timed stat modifiers
//! - [`gladiator`]: the gladiator and its decision state machine
//!
//! Entities never hold references to each other. A gladiator's hostile and
//! power-up targets are plain [`EntityId`]s resolved through the
//! [`Arena`](crate::arena::Arena) every time they are used, so a destroyed
//! entity can never be dereferenced.
//!
//! # Example
//!
//! ```
//! use gladiator_core::entity::EntityId;
//!
//! let id1 = EntityId::new(1);
//! let id2 = EntityId::new(2);
//!
//! assert!(id1 < id2);
//! assert_eq!(id1.as_u64(), 1);
//! ```

pub mod gladiator;
pub mod stats;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use gladiator::{FsmState, Gladiator, GladiatorSnapshot, Intent, Perception, Sighting};
pub use stats::{AgentStats, EffectFlags, ModifierId, ModifierStack, StatKind, StatModifier};

/// Unique identifier for an entity.
///
/// Gladiators and effects share one id space per [`Arena`](crate::arena::Arena).
/// Ids are handed out monotonically and are never reused, not even across
/// matches, so a stale id always resolves to nothing.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}
