//! Combat resolution.
//!
//! A strike is resolved in three steps:
//!
//! 1. Dodge: `roll < defender.luck * dodge_factor` → no damage
//! 2. Critical: `roll < attacker.luck * crit_factor` → damage × `crit_multiplier`
//! 3. Damage: `max(min_damage, floor((strength - defense / 2) * multiplier))`
//!
//! The pure part takes pre-rolled [`AttackRolls`] so the formula can be
//! checked exactly; [`resolve_attack`] draws the rolls from an RNG.
//!
//! # Example
//!
//! ```
//! use gladiator_core::config::CombatConfig;
//! use gladiator_core::entity::AgentStats;
//! use gladiator_core::resolver::{resolve_attack_with_rolls, AttackRolls};
//!
//! let attacker = AgentStats::from_attributes(12.0, 150.0, 1.0, 2.0, 0.5, 0.1);
//! let defender = AgentStats::from_attributes(8.0, 150.0, 4.0, 2.0, 0.5, 0.1);
//! let rolls = AttackRolls { dodge: 0.99, crit: 0.99 };
//!
//! let outcome = resolve_attack_with_rolls(&attacker, &defender, &CombatConfig::default(), rolls);
//! assert!(!outcome.dodged && !outcome.critical);
//! assert_eq!(outcome.damage, 10.0);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::config::CombatConfig;
use crate::entity::{AgentStats, EntityId};

/// Unit rolls consumed by one strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackRolls {
    /// Dodge roll in `[0, 1)`.
    pub dodge: f32,
    /// Critical roll in `[0, 1)`.
    pub crit: f32,
}

impl AttackRolls {
    /// Draws both rolls.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            dodge: rng.gen(),
            crit: rng.gen(),
        }
    }
}

/// Result of one strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// The defender evaded; nothing else applies.
    pub dodged: bool,
    /// The critical multiplier was applied.
    pub critical: bool,
    /// Damage to apply, zero on a dodge.
    pub damage: f32,
}

/// Flat-floor damage of a landed hit.
#[must_use]
pub fn base_damage(strength: f32, defense: f32, multiplier: f32, min_damage: f32) -> f32 {
    ((strength - defense / 2.0) * multiplier).floor().max(min_damage)
}

/// Resolves a strike from known rolls.
#[must_use]
pub fn resolve_attack_with_rolls(
    attacker: &AgentStats,
    defender: &AgentStats,
    config: &CombatConfig,
    rolls: AttackRolls,
) -> AttackOutcome {
    if rolls.dodge < defender.luck * config.dodge_factor {
        return AttackOutcome {
            dodged: true,
            critical: false,
            damage: 0.0,
        };
    }

    let critical = rolls.crit < attacker.luck * config.crit_factor;
    let multiplier = if critical { config.crit_multiplier } else { 1.0 };
    AttackOutcome {
        dodged: false,
        critical,
        damage: base_damage(attacker.strength, defender.defense, multiplier, config.min_damage),
    }
}

/// Resolves a strike, drawing rolls from `rng`.
pub fn resolve_attack<R: Rng + ?Sized>(
    attacker: &AgentStats,
    defender: &AgentStats,
    config: &CombatConfig,
    rng: &mut R,
) -> AttackOutcome {
    resolve_attack_with_rolls(attacker, defender, config, AttackRolls::roll(rng))
}

/// A strike that was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeReport {
    /// Attacking gladiator.
    pub attacker: EntityId,
    /// Defending gladiator.
    pub defender: EntityId,
    /// Rolled outcome.
    pub outcome: AttackOutcome,
    /// Defender health after the strike.
    pub defender_health: f32,
    /// True if this strike knocked the defender out.
    pub knocked_out: bool,
}

/// Applies strikes to gladiators in an [`Arena`].
#[derive(Debug, Clone, Default)]
pub struct CombatResolver;

impl CombatResolver {
    /// Creates a new combat resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolves and applies one strike using effective stats.
    ///
    /// Returns `None` without rolling if either party is missing or already
    /// knocked out.
    pub fn strike<R: Rng + ?Sized>(
        &self,
        arena: &mut Arena,
        attacker: EntityId,
        defender: EntityId,
        config: &CombatConfig,
        rng: &mut R,
    ) -> Option<StrikeReport> {
        if attacker == defender {
            return None;
        }
        let attacker_stats = arena.active_gladiator(attacker)?.effective_stats();
        let target = arena.active_gladiator_mut(defender)?;
        let outcome = resolve_attack(&attacker_stats, &target.effective_stats(), config, rng);
        let knocked_out = target.take_damage(outcome.damage);

        tracing::debug!(
            %attacker,
            %defender,
            dodged = outcome.dodged,
            critical = outcome.critical,
            damage = outcome.damage,
            "attack resolved"
        );

        Some(StrikeReport {
            attacker,
            defender,
            outcome,
            defender_health: target.health(),
            knocked_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Gladiator;
    use glam::Vec2;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn stats(strength: f32, defense: f32, luck: f32) -> AgentStats {
        AgentStats::from_attributes(strength, 150.0, defense, 2.0, 0.5, luck)
    }

    const NO_DODGE_NO_CRIT: AttackRolls = AttackRolls {
        dodge: 0.999,
        crit: 0.999,
    };

    mod formula_tests {
        use super::*;

        #[test]
        fn documented_fixture() {
            let outcome = resolve_attack_with_rolls(
                &stats(12.0, 1.0, 0.1),
                &stats(8.0, 4.0, 0.1),
                &CombatConfig::default(),
                NO_DODGE_NO_CRIT,
            );
            assert_eq!(
                outcome,
                AttackOutcome {
                    dodged: false,
                    critical: false,
                    damage: 10.0
                }
            );
        }

        #[test]
        fn floor_applies_before_minimum() {
            assert_eq!(base_damage(15.0, 1.0, 1.0, 10.0), 14.0);
            assert_eq!(base_damage(15.0, 1.0, 2.0, 10.0), 29.0);
            assert_eq!(base_damage(5.0, 5.0, 1.0, 10.0), 10.0);
        }

        #[test]
        fn critical_doubles_damage() {
            let outcome = resolve_attack_with_rolls(
                &stats(14.0, 1.0, 0.2),
                &stats(8.0, 2.0, 0.0),
                &CombatConfig::default(),
                AttackRolls { dodge: 0.5, crit: 0.0 },
            );
            assert!(outcome.critical);
            assert_eq!(outcome.damage, 26.0);
        }

        #[test]
        fn dodge_short_circuits() {
            let outcome = resolve_attack_with_rolls(
                &stats(14.0, 1.0, 0.2),
                &stats(8.0, 2.0, 0.2),
                &CombatConfig::default(),
                AttackRolls { dodge: 0.05, crit: 0.0 },
            );
            assert!(outcome.dodged);
            assert!(!outcome.critical);
            assert_eq!(outcome.damage, 0.0);
        }

        #[test]
        fn zero_luck_never_dodges_or_crits() {
            let outcome = resolve_attack_with_rolls(
                &stats(10.0, 1.0, 0.0),
                &stats(10.0, 1.0, 0.0),
                &CombatConfig::default(),
                AttackRolls { dodge: 0.0, crit: 0.0 },
            );
            assert!(!outcome.dodged && !outcome.critical);
        }
    }

    mod strike_tests {
        use super::*;

        fn arena_with(a: AgentStats, b: AgentStats) -> (Arena, EntityId, EntityId) {
            let mut arena = Arena::new();
            let x = arena.spawn_gladiator(|id| Gladiator::new(id, a, Vec2::ZERO, 1000));
            let y = arena.spawn_gladiator(|id| Gladiator::new(id, b, Vec2::ZERO, 1000));
            (arena, x, y)
        }

        #[test]
        fn strike_applies_damage_to_defender() {
            let (mut arena, a, b) = arena_with(stats(12.0, 1.0, 0.0), stats(8.0, 4.0, 0.0));
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let report = CombatResolver::new()
                .strike(&mut arena, a, b, &CombatConfig::default(), &mut rng)
                .unwrap();
            assert_eq!(report.outcome.damage, 10.0);
            assert_eq!(arena.gladiator(b).unwrap().health(), 170.0);
            assert_eq!(report.defender_health, 170.0);
            assert!(!report.knocked_out);
        }

        #[test]
        fn strike_reports_knockout_once() {
            let (mut arena, a, b) = arena_with(stats(12.0, 1.0, 0.0), stats(8.0, 1.0, 0.0));
            arena.gladiator_mut(b).unwrap().take_damage(115.0);
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let resolver = CombatResolver::new();
            let config = CombatConfig::default();

            let report = resolver.strike(&mut arena, a, b, &config, &mut rng).unwrap();
            assert!(report.knocked_out);
            assert!(resolver.strike(&mut arena, a, b, &config, &mut rng).is_none());
        }

        #[test]
        fn missing_parties_are_ignored() {
            let (mut arena, a, b) = arena_with(stats(12.0, 1.0, 0.0), stats(8.0, 1.0, 0.0));
            arena.despawn_gladiator(b);
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let resolver = CombatResolver::new();
            let config = CombatConfig::default();
            assert!(resolver.strike(&mut arena, a, b, &config, &mut rng).is_none());
            assert!(resolver.strike(&mut arena, a, a, &config, &mut rng).is_none());
        }
    }

    proptest! {
        #[test]
        fn landed_hits_never_fall_below_minimum(
            strength in 0.0f32..30.0,
            defense in 0.0f32..60.0,
            crit in 0.0f32..1.0,
        ) {
            let outcome = resolve_attack_with_rolls(
                &stats(strength, 1.0, 0.1),
                &stats(5.0, defense, 0.0),
                &CombatConfig::default(),
                AttackRolls { dodge: 0.5, crit },
            );
            prop_assert!(!outcome.dodged);
            prop_assert!(outcome.damage >= 10.0);
            prop_assert_eq!(outcome.damage, outcome.damage.floor());
        }
    }
}
