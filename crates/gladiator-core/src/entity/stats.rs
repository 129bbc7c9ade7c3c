//! Gladiator stat blocks.
//!
//! [`AgentStats`] holds the base attributes rolled at creation plus current
//! and maximum health. Base attributes never change after creation. Timed
//! power-up effects are layered on top as [`StatModifier`]s in a
//! [`ModifierStack`]; the effective value of a stat is always recomputed as
//! `base * product(factors)`, so removing a modifier restores the exact
//! pre-effect value no matter how many effects overlapped in between.

use bitflags::bitflags;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::StatRanges;

/// Base health of every gladiator before the defense bonus.
pub const BASE_HEALTH: f32 = 100.0;

/// Health granted per point of defense.
pub const HEALTH_PER_DEFENSE: f32 = 20.0;

// =============================================================================
// Stats
// =============================================================================

/// Identifies one attribute of [`AgentStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Damage potential.
    Strength,
    /// Movement speed.
    Speed,
    /// Damage resistance.
    Defense,
    /// Power-up awareness.
    Intelligence,
    /// Engagement chance.
    Aggression,
    /// Dodge and critical factor.
    Luck,
}

/// A gladiator's attribute set and health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    /// Damage potential.
    pub strength: f32,
    /// Movement speed in units per second.
    pub speed: f32,
    /// Damage resistance.
    pub defense: f32,
    /// Power-up awareness.
    pub intelligence: f32,
    /// Engagement chance in `[0, 1]`.
    pub aggression: f32,
    /// Dodge and critical factor in `[0, 1]`.
    pub luck: f32,
    /// Current health, `0 <= health <= max_health`.
    pub health: f32,
    /// Maximum health, fixed at creation.
    pub max_health: f32,
}

impl AgentStats {
    /// Builds a stat block from attributes, deriving health from defense.
    #[must_use]
    pub fn from_attributes(
        strength: f32,
        speed: f32,
        defense: f32,
        intelligence: f32,
        aggression: f32,
        luck: f32,
    ) -> Self {
        let max_health = max_health_for(defense);
        Self {
            strength,
            speed,
            defense,
            intelligence,
            aggression,
            luck,
            health: max_health,
            max_health,
        }
    }

    /// Rolls a fresh stat block, each attribute uniform within its range.
    ///
    /// `max_health = floor(100 + defense * 20)` and the gladiator starts at
    /// full health.
    pub fn generate<R: Rng + ?Sized>(ranges: &StatRanges, rng: &mut R) -> Self {
        Self::from_attributes(
            ranges.strength.lerp(rng.gen()),
            ranges.speed.lerp(rng.gen()),
            ranges.defense.lerp(rng.gen()),
            ranges.intelligence.lerp(rng.gen()),
            ranges.aggression.lerp(rng.gen()),
            ranges.luck.lerp(rng.gen()),
        )
    }

    /// Returns one attribute by kind.
    #[must_use]
    pub fn get(&self, kind: StatKind) -> f32 {
        match kind {
            StatKind::Strength => self.strength,
            StatKind::Speed => self.speed,
            StatKind::Defense => self.defense,
            StatKind::Intelligence => self.intelligence,
            StatKind::Aggression => self.aggression,
            StatKind::Luck => self.luck,
        }
    }

    fn get_mut(&mut self, kind: StatKind) -> &mut f32 {
        match kind {
            StatKind::Strength => &mut self.strength,
            StatKind::Speed => &mut self.speed,
            StatKind::Defense => &mut self.defense,
            StatKind::Intelligence => &mut self.intelligence,
            StatKind::Aggression => &mut self.aggression,
            StatKind::Luck => &mut self.luck,
        }
    }

    /// Health as a fraction of max health.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    /// Returns false if any value is non-finite or health is out of bounds.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let attributes = [
            self.strength,
            self.speed,
            self.defense,
            self.intelligence,
            self.aggression,
            self.luck,
            self.health,
            self.max_health,
        ];
        attributes.iter().all(|v| v.is_finite())
            && self.max_health > 0.0
            && (0.0..=self.max_health).contains(&self.health)
    }
}

/// `floor(100 + defense * 20)`.
#[must_use]
pub fn max_health_for(defense: f32) -> f32 {
    (BASE_HEALTH + defense * HEALTH_PER_DEFENSE).floor()
}

// =============================================================================
// Modifiers
// =============================================================================

bitflags! {
    /// Timed effects currently acting on a gladiator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EffectFlags: u8 {
        /// Shield power-up raising defense.
        const SHIELDED = 1 << 0;
        /// Trap power-up lowering speed.
        const SLOWED = 1 << 1;
        /// Chaos power-up multiplying defense.
        const FORTIFIED = 1 << 2;
        /// Chaos power-up scrambling movement.
        const CONFUSED = 1 << 3;
    }
}

/// Handle of one applied modifier, unique per gladiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModifierId(u32);

impl ModifierId {
    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// A multiplicative, removable change to one stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    /// Handle used to revert this modifier.
    pub id: ModifierId,
    /// Affected stat.
    pub stat: StatKind,
    /// Multiplier applied to the base value.
    pub factor: f32,
    /// Which effect this modifier represents.
    pub source: EffectFlags,
}

/// Active modifiers of one gladiator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierStack {
    next_id: u32,
    active: Vec<StatModifier>,
}

impl ModifierStack {
    /// Adds a modifier and returns its handle.
    pub fn push(&mut self, stat: StatKind, factor: f32, source: EffectFlags) -> ModifierId {
        let id = ModifierId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.active.push(StatModifier {
            id,
            stat,
            factor,
            source,
        });
        id
    }

    /// Removes a modifier. Returns false if it was already gone.
    pub fn remove(&mut self, id: ModifierId) -> bool {
        let before = self.active.len();
        self.active.retain(|m| m.id != id);
        self.active.len() != before
    }

    /// Product of all factors acting on `stat`.
    #[must_use]
    pub fn factor(&self, stat: StatKind) -> f32 {
        self.active
            .iter()
            .filter(|m| m.stat == stat)
            .map(|m| m.factor)
            .product()
    }

    /// Applies all modifiers to a base stat block.
    ///
    /// Health is not modified.
    #[must_use]
    pub fn apply(&self, base: &AgentStats) -> AgentStats {
        let mut effective = *base;
        for modifier in &self.active {
            *effective.get_mut(modifier.stat) *= modifier.factor;
        }
        effective
    }

    /// Union of the sources of all active modifiers.
    #[must_use]
    pub fn flags(&self) -> EffectFlags {
        self.active
            .iter()
            .fold(EffectFlags::empty(), |acc, m| acc | m.source)
    }

    /// Number of active modifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns true if no modifier is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Drops every modifier.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}
