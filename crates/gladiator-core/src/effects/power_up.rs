//! Power-up payloads.
//!
//! Picking up a power-up applies its payload to the gladiator immediately
//! and returns the follow-up [`Task`]s that undo or continue it. Stat changes
//! are pushed as modifiers and reverted by handle, never by applying an
//! inverse multiplier.
//!
//! | Kind   | Immediate                         | Deferred                        |
//! |--------|-----------------------------------|---------------------------------|
//! | Shield | defense × (1 + multiplier)        | revert after duration           |
//! | Trap   | speed × multiplier, fixed damage  | revert after duration           |
//! | Chaos  | one [`ChaosRoll`] outcome         | revert or confusion ticks       |
//!
//! A [`Pickup`] pairs the kind with its chaos outcome, so a chaos pickup
//! cannot be applied without one.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Effect, EffectKind, Payload, PowerUpKind};
use crate::config::PowerUpConfig;
use crate::entity::{EffectFlags, EntityId, Gladiator, StatKind};
use crate::scheduler::Task;

/// Outcome of a chaos pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChaosRoll {
    /// Defense multiplied by the chaos defense factor for the duration.
    Fortify,
    /// Random headings every confusion interval for the duration.
    Confusion,
    /// Fixed heal, capped at max health.
    Heal,
    /// Fixed damage.
    Harm,
}

impl ChaosRoll {
    /// Picks one of fortify, confusion or a health swing uniformly; the
    /// health swing is a fair coin between heal and harm.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.gen_range(0..3) {
            0 => Self::Fortify,
            1 => Self::Confusion,
            _ => {
                if rng.gen_bool(0.5) {
                    Self::Heal
                } else {
                    Self::Harm
                }
            }
        }
    }
}

/// A power-up kind with everything rolled at pickup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pickup {
    /// Shield pickup.
    Shield,
    /// Trap pickup.
    Trap,
    /// Chaos pickup with its outcome.
    Chaos(ChaosRoll),
}

impl Pickup {
    /// Resolves a pickup of `kind`, rolling the chaos outcome if needed.
    pub fn roll<R: Rng + ?Sized>(kind: PowerUpKind, rng: &mut R) -> Self {
        match kind {
            PowerUpKind::Shield => Self::Shield,
            PowerUpKind::Trap => Self::Trap,
            PowerUpKind::Chaos => Self::Chaos(ChaosRoll::roll(rng)),
        }
    }

    /// The power-up kind picked up.
    #[must_use]
    pub fn kind(self) -> PowerUpKind {
        match self {
            Self::Shield => PowerUpKind::Shield,
            Self::Trap => PowerUpKind::Trap,
            Self::Chaos(_) => PowerUpKind::Chaos,
        }
    }
}

/// Result of applying a power-up.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PowerUpApplication {
    /// Chaos outcome, for chaos pickups.
    pub chaos: Option<ChaosRoll>,
    /// Health lost on pickup.
    pub damage: f32,
    /// True if the pickup knocked the gladiator out.
    pub knocked_out: bool,
    /// Tasks to schedule, as `(delay_ms, task)`.
    pub follow_ups: Vec<(u64, Task)>,
}

/// Rolls the payload of a freshly spawned power-up.
pub fn roll_payload<R: Rng + ?Sized>(
    kind: PowerUpKind,
    config: &PowerUpConfig,
    rng: &mut R,
) -> Payload {
    match kind {
        PowerUpKind::Shield => Payload {
            duration_ms: config.shield_duration_ms,
            multiplier: config.shield_multiplier,
            damage: 0.0,
        },
        PowerUpKind::Trap => Payload {
            duration_ms: config.trap_duration_ms,
            multiplier: config.trap_multiplier,
            damage: config.trap_damage,
        },
        PowerUpKind::Chaos => Payload {
            duration_ms: rng.gen_range(config.chaos_duration.min_ms..=config.chaos_duration.max_ms),
            multiplier: config.chaos_defense_factor,
            damage: config.chaos_damage,
        },
    }
}

/// Creates a power-up of a random kind at a random position inside the
/// world minus `spawn_margin`.
pub fn spawn<R: Rng + ?Sized>(
    id: EntityId,
    world: Vec2,
    config: &PowerUpConfig,
    now_ms: u64,
    rng: &mut R,
) -> Effect {
    let kind = PowerUpKind::ALL[rng.gen_range(0..PowerUpKind::ALL.len())];
    let margin = config.spawn_margin.min(world.x / 2.0).min(world.y / 2.0);
    let position = Vec2::new(
        margin + rng.gen::<f32>() * (world.x - 2.0 * margin),
        margin + rng.gen::<f32>() * (world.y - 2.0 * margin),
    );
    Effect {
        id,
        kind: EffectKind::PowerUp(kind),
        position,
        velocity: Vec2::ZERO,
        half_extents: Vec2::splat(12.0),
        payload: roll_payload(kind, config, rng),
        created_at_ms: now_ms,
        lifespan_ms: Some(config.lifespan_ms),
        gravity: 0.0,
    }
}

/// Applies a power-up, rolling the chaos outcome if needed.
pub fn apply<R: Rng + ?Sized>(
    gladiator: &mut Gladiator,
    kind: PowerUpKind,
    payload: &Payload,
    config: &PowerUpConfig,
    now_ms: u64,
    rng: &mut R,
) -> PowerUpApplication {
    apply_resolved(gladiator, Pickup::roll(kind, rng), payload, config, now_ms)
}

/// Applies a fully resolved pickup.
///
/// A knocked-out gladiator is left untouched.
pub fn apply_resolved(
    gladiator: &mut Gladiator,
    pickup: Pickup,
    payload: &Payload,
    config: &PowerUpConfig,
    now_ms: u64,
) -> PowerUpApplication {
    let mut out = PowerUpApplication::default();
    if !gladiator.is_active() {
        return out;
    }
    let agent = gladiator.id();

    match pickup {
        Pickup::Shield => {
            let factor = 1.0 + payload.multiplier;
            timed(gladiator, StatKind::Defense, factor, EffectFlags::SHIELDED, payload, &mut out);
        }
        Pickup::Trap => {
            let factor = payload.multiplier;
            timed(gladiator, StatKind::Speed, factor, EffectFlags::SLOWED, payload, &mut out);
            out.damage = payload.damage;
            out.knocked_out = gladiator.take_damage(payload.damage);
        }
        Pickup::Chaos(roll) => {
            out.chaos = Some(roll);
            match roll {
                ChaosRoll::Fortify => timed(
                    gladiator,
                    StatKind::Defense,
                    payload.multiplier,
                    EffectFlags::FORTIFIED,
                    payload,
                    &mut out,
                ),
                ChaosRoll::Confusion => {
                    let until_ms = now_ms.saturating_add(payload.duration_ms);
                    gladiator.confuse_until(until_ms);
                    out.follow_ups.push((
                        config.confusion_interval_ms,
                        Task::ConfusionTick { agent, until_ms },
                    ));
                }
                ChaosRoll::Heal => gladiator.heal(config.chaos_heal),
                ChaosRoll::Harm => {
                    out.damage = config.chaos_damage;
                    out.knocked_out = gladiator.take_damage(config.chaos_damage);
                }
            }
        }
    }

    tracing::debug!(
        gladiator = %agent,
        kind = ?pickup.kind(),
        chaos = ?out.chaos,
        "power-up applied"
    );
    out
}

/// Pushes a modifier and queues its revert after the payload duration.
fn timed(
    gladiator: &mut Gladiator,
    stat: StatKind,
    factor: f32,
    source: EffectFlags,
    payload: &Payload,
    out: &mut PowerUpApplication,
) {
    if let Some(modifier) = gladiator.add_modifier(stat, factor, source) {
        let agent = gladiator.id();
        out.follow_ups
            .push((payload.duration_ms, Task::RevertModifier { agent, modifier }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn gladiator() -> Gladiator {
        let stats = crate::entity::AgentStats::from_attributes(10.0, 150.0, 2.0, 2.0, 0.5, 0.1);
        Gladiator::new(EntityId::new(4), stats, Vec2::new(100.0, 100.0), 1000)
    }

    fn payload(kind: PowerUpKind) -> Payload {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        roll_payload(kind, &PowerUpConfig::default(), &mut rng)
    }

    mod shield_tests {
        use super::*;

        #[test]
        fn shield_raises_defense_and_schedules_revert() {
            let mut g = gladiator();
            let config = PowerUpConfig::default();
            let p = payload(PowerUpKind::Shield);
            let out = apply_resolved(&mut g, Pickup::Shield, &p, &config, 0);

            assert!((g.effective(StatKind::Defense) - 3.0).abs() < 1e-6);
            assert!(g.flags(0).contains(EffectFlags::SHIELDED));
            assert_eq!(out.follow_ups.len(), 1);
            let (delay, task) = out.follow_ups[0];
            assert_eq!(delay, 8000);
            let Task::RevertModifier { agent, modifier } = task else {
                panic!("expected a revert task, got {task:?}");
            };
            assert_eq!(agent, g.id());
            assert!(g.remove_modifier(modifier));
            assert_eq!(g.effective(StatKind::Defense), 2.0);
        }
    }

    mod trap_tests {
        use super::*;

        #[test]
        fn trap_halves_speed_and_deals_pickup_damage_once() {
            let mut g = gladiator();
            let before = g.health();
            let p = payload(PowerUpKind::Trap);
            let out = apply_resolved(&mut g, Pickup::Trap, &p, &PowerUpConfig::default(), 0);

            assert_eq!(g.effective(StatKind::Speed), 75.0);
            assert_eq!(g.health(), before - 10.0);
            assert_eq!(out.damage, 10.0);
            assert!(!out.knocked_out);
            assert_eq!(out.follow_ups[0].0, 3000);
        }
    }

    mod chaos_tests {
        use super::*;

        #[test]
        fn fortify_multiplies_defense_by_ten() {
            let mut g = gladiator();
            let p = payload(PowerUpKind::Chaos);
            let config = PowerUpConfig::default();
            let out = apply_resolved(&mut g, Pickup::Chaos(ChaosRoll::Fortify), &p, &config, 0);
            assert_eq!(p.multiplier, 10.0);
            assert_eq!(g.effective(StatKind::Defense), 20.0);
            assert_eq!(out.follow_ups[0].0, p.duration_ms);
        }

        #[test]
        fn confusion_arms_ticks_until_duration() {
            let mut g = gladiator();
            let p = Payload {
                duration_ms: 4000,
                multiplier: 1.0,
                damage: 30.0,
            };
            let config = PowerUpConfig::default();
            let pickup = Pickup::Chaos(ChaosRoll::Confusion);
            let out = apply_resolved(&mut g, pickup, &p, &config, 1000);
            assert!(g.is_confused(1000));
            assert!(!g.is_confused(5000));
            assert_eq!(
                out.follow_ups,
                vec![(500, Task::ConfusionTick { agent: g.id(), until_ms: 5000 })]
            );
        }

        #[test]
        fn heal_is_capped_and_harm_is_fixed() {
            let config = PowerUpConfig::default();
            let p = payload(PowerUpKind::Chaos);

            let mut g = gladiator();
            g.take_damage(20.0);
            apply_resolved(&mut g, Pickup::Chaos(ChaosRoll::Heal), &p, &config, 0);
            assert_eq!(g.health(), g.stats().max_health);

            let mut g = gladiator();
            let before = g.health();
            let out = apply_resolved(&mut g, Pickup::Chaos(ChaosRoll::Harm), &p, &config, 0);
            assert_eq!(g.health(), before - 30.0);
            assert!(out.follow_ups.is_empty());
        }

        #[test]
        fn rolled_pickup_keeps_its_kind() {
            let mut rng = ChaCha8Rng::seed_from_u64(3);
            for kind in PowerUpKind::ALL {
                assert_eq!(Pickup::roll(kind, &mut rng).kind(), kind);
            }
            assert!(matches!(
                Pickup::roll(PowerUpKind::Chaos, &mut rng),
                Pickup::Chaos(_)
            ));
        }

        #[test]
        fn every_outcome_is_reachable() {
            let mut rng = ChaCha8Rng::seed_from_u64(99);
            let mut seen = std::collections::HashSet::new();
            for _ in 0..200 {
                seen.insert(ChaosRoll::roll(&mut rng));
            }
            assert_eq!(seen.len(), 4);
        }
    }

    #[test]
    fn knocked_out_gladiator_is_untouched() {
        let mut g = gladiator();
        g.take_damage(10_000.0);
        let p = payload(PowerUpKind::Shield);
        let out = apply_resolved(&mut g, Pickup::Shield, &p, &PowerUpConfig::default(), 0);
        assert!(out.follow_ups.is_empty());
        assert_eq!(g.effective(StatKind::Defense), 2.0);
    }

    #[test]
    fn spawned_power_ups_respect_margin_and_lifespan() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = PowerUpConfig::default();
        let world = Vec2::new(800.0, 600.0);
        for i in 0..100 {
            let e = spawn(EntityId::new(i), world, &config, 42, &mut rng);
            assert!(e.is_power_up());
            assert!(e.position.x >= 50.0 && e.position.x <= 750.0);
            assert!(e.position.y >= 50.0 && e.position.y <= 550.0);
            assert_eq!(e.lifespan_ms, Some(10_000));
            assert_eq!(e.created_at_ms, 42);
        }
    }
}
