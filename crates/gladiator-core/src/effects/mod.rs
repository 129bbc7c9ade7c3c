//! Environmental effects: power-ups and hazards.
//!
//! An [`Effect`] is a passive arena entity that mutates the gladiator it
//! touches. Both families share one struct; the [`EffectKind`] sum type
//! selects the behavior and every dispatch over it is an exhaustive match.
//!
//! - [`power_up`]: single-use pickups with timed, reversible payloads
//! - [`hazard`]: moving dangers that persist until they leave the world,
//!   expire or hit someone
//! - [`spawner`]: randomized spawn intervals and spawn positions
//!
//! Effects never hold a reference to the gladiators they affect. Timed
//! reversals are scheduled as [`Task`](crate::scheduler::Task)s owned by the
//! affected gladiator, so a consumed power-up does not outlive its contact.

pub mod hazard;
pub mod power_up;
pub mod spawner;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

pub use hazard::HazardHit;
pub use power_up::{ChaosRoll, Pickup, PowerUpApplication};
pub use spawner::SpawnTimer;

// =============================================================================
// Kinds
// =============================================================================

/// Beneficial (or treacherous) single-use pickups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Raises defense for a while.
    Shield,
    /// Slows and damages whoever picks it up.
    Trap,
    /// One random outcome out of several.
    Chaos,
}

impl PowerUpKind {
    /// All kinds in spawn-roll order.
    pub const ALL: [Self; 3] = [Self::Shield, Self::Trap, Self::Chaos];
}

/// Moving arena dangers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    /// Lethal wall sweeping across the arena.
    SpikeWall,
    /// Falling projectile with randomized damage.
    Fireball,
}

impl HazardKind {
    /// All kinds in spawn-roll order.
    pub const ALL: [Self; 2] = [Self::SpikeWall, Self::Fireball];
}

/// Tagged effect kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// A power-up.
    PowerUp(PowerUpKind),
    /// A hazard.
    Hazard(HazardKind),
}

/// Parameters rolled when an effect spawns.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Payload {
    /// How long the timed part of the effect lasts.
    pub duration_ms: u64,
    /// Stat multiplier.
    pub multiplier: f32,
    /// Immediate damage on contact.
    pub damage: f32,
}

// =============================================================================
// Effect
// =============================================================================

/// A power-up or hazard present in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Entity id, shared id space with gladiators.
    pub id: EntityId,
    /// What this effect does.
    pub kind: EffectKind,
    /// Center position.
    pub position: Vec2,
    /// Current velocity; zero for power-ups.
    pub velocity: Vec2,
    /// Half size of the axis-aligned collision box.
    pub half_extents: Vec2,
    /// Rolled parameters.
    pub payload: Payload,
    /// Spawn time.
    pub created_at_ms: u64,
    /// Expiry delay, if the effect expires by timer.
    pub lifespan_ms: Option<u64>,
    /// Downward acceleration.
    pub gravity: f32,
}

impl Effect {
    /// Returns the power-up kind, if this is a power-up.
    #[must_use]
    pub fn power_up_kind(&self) -> Option<PowerUpKind> {
        match self.kind {
            EffectKind::PowerUp(kind) => Some(kind),
            EffectKind::Hazard(_) => None,
        }
    }

    /// Returns the hazard kind, if this is a hazard.
    #[must_use]
    pub fn hazard_kind(&self) -> Option<HazardKind> {
        match self.kind {
            EffectKind::Hazard(kind) => Some(kind),
            EffectKind::PowerUp(_) => None,
        }
    }

    /// Returns true for power-ups.
    #[must_use]
    pub fn is_power_up(&self) -> bool {
        matches!(self.kind, EffectKind::PowerUp(_))
    }

    /// Returns true if a circle overlaps the collision box.
    #[must_use]
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        let min = self.position - self.half_extents;
        let max = self.position + self.half_extents;
        let closest = center.clamp(min, max);
        closest.distance_squared(center) <= radius * radius
    }

    /// Read-only view.
    #[must_use]
    pub fn snapshot(&self) -> EffectSnapshot {
        EffectSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            velocity: self.velocity,
            half_extents: self.half_extents,
        }
    }
}

/// Read-only effect state for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSnapshot {
    /// Entity id.
    pub id: EntityId,
    /// Effect kind.
    pub kind: EffectKind,
    /// Center position.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Half size of the collision box.
    pub half_extents: Vec2,
}
