//! Arena configuration.
//!
//! All tunables of the simulation live in [`ArenaConfig`]. The defaults
//! reproduce the stock arena (800×600 world, four gladiators, 60 second
//! matches). Configuration is plain serde data so hosts can load it from any
//! format; call [`ArenaConfig::validate`] before handing it to a
//! [`Simulation`](crate::simulation::Simulation).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// =============================================================================
// Ranges
// =============================================================================

/// Inclusive-exclusive `[min, max)` range of `f32` values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRange {
    /// Lower bound (inclusive).
    pub min: f32,
    /// Upper bound (exclusive, unless equal to `min`).
    pub max: f32,
}

impl StatRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Linearly maps a unit sample in `[0, 1)` onto the range.
    ///
    /// A degenerate range (`min == max`) always yields `min`.
    #[must_use]
    pub fn lerp(&self, unit: f32) -> f32 {
        self.min + unit * (self.max - self.min)
    }

    /// Returns true if `value` lies within `[min, max]`.
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::InvalidRange {
                field,
                min: f64::from(self.min),
                max: f64::from(self.max),
            });
        }
        Ok(())
    }
}

/// Range of millisecond durations, `[min_ms, max_ms]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MillisRange {
    /// Shortest duration.
    pub min_ms: u64,
    /// Longest duration.
    pub max_ms: u64,
}

impl MillisRange {
    /// Creates a new millisecond range.
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    #[allow(clippy::cast_precision_loss)]
    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms || self.max_ms == 0 {
            return Err(ConfigError::InvalidRange {
                field,
                min: self.min_ms as f64,
                max: self.max_ms as f64,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Sections
// =============================================================================

/// World geometry and spawn zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World width in units.
    pub width: f32,
    /// World height in units.
    pub height: f32,
    /// Distance of each corner spawn zone from the world edges.
    pub spawn_margin: f32,
    /// Side length of a square spawn zone.
    pub spawn_zone_size: f32,
    /// How far outside the world an effect may drift before it is destroyed.
    pub out_of_bounds_padding: f32,
}

impl WorldConfig {
    /// World dimensions as a vector.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Returns true if `point` lies inside the world rectangle.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }

    /// Returns true if `point` lies beyond the world rectangle plus padding.
    #[must_use]
    pub fn is_far_outside(&self, point: Vec2) -> bool {
        let pad = self.out_of_bounds_padding;
        point.x < -pad
            || point.x > self.width + pad
            || point.y < -pad
            || point.y > self.height + pad
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            spawn_margin: 80.0,
            spawn_zone_size: 100.0,
            out_of_bounds_padding: 100.0,
        }
    }
}

/// Per-stat ranges used by the stat generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatRanges {
    /// Damage potential.
    pub strength: StatRange,
    /// Movement speed in units per second.
    pub speed: StatRange,
    /// Damage resistance; also drives max health.
    pub defense: StatRange,
    /// Willingness to chase power-ups.
    pub intelligence: StatRange,
    /// Chance to engage a hostile target each tick.
    pub aggression: StatRange,
    /// Dodge and critical factor.
    pub luck: StatRange,
}

impl Default for StatRanges {
    fn default() -> Self {
        Self {
            strength: StatRange::new(5.0, 15.0),
            speed: StatRange::new(100.0, 200.0),
            defense: StatRange::new(1.0, 5.0),
            intelligence: StatRange::new(1.0, 3.0),
            aggression: StatRange::new(0.3, 0.9),
            luck: StatRange::new(0.0, 0.2),
        }
    }
}

/// Combat resolution tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Dodge chance is `defender.luck * dodge_factor`.
    pub dodge_factor: f32,
    /// Critical chance is `attacker.luck * crit_factor`.
    pub crit_factor: f32,
    /// Damage multiplier applied on a critical hit.
    pub crit_multiplier: f32,
    /// Minimum damage of a landed hit.
    pub min_damage: f32,
    /// Distance under which a hostile target can be attacked.
    pub attack_range: f32,
    /// Minimum time between two attacks of the same gladiator.
    pub attack_cooldown_ms: u64,
    /// Delay between an attack and its recoil movement.
    pub break_deadlock_delay_ms: u64,
    /// Delay between a knockout and removal from the arena.
    pub knockout_grace_ms: u64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            dodge_factor: 0.5,
            crit_factor: 3.0,
            crit_multiplier: 2.0,
            min_damage: 10.0,
            attack_range: 120.0,
            attack_cooldown_ms: 1000,
            break_deadlock_delay_ms: 200,
            knockout_grace_ms: 1000,
        }
    }
}

/// Agent decision tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Health fraction under which a gladiator always evades.
    pub evade_health_fraction: f32,
    /// Per-tick chance that an idle gladiator picks a new heading.
    pub idle_wander_chance: f32,
    /// Idle movement speed as a fraction of speed.
    pub idle_speed_factor: f32,
    /// Per-tick chance that a seeking gladiator gives up.
    pub seek_stall_chance: f32,
    /// Per-tick chance of spontaneous re-engagement.
    pub reengage_chance: f32,
    /// Recoil speed after an attack, as a fraction of speed.
    pub attack_recoil_factor: f32,
    /// How long the recoil overrides the attack stance.
    pub attack_recoil_ms: u64,
    /// Number of escape points probed while evading (at most 8).
    pub evade_candidates: u8,
    /// Probe distance as a multiple of speed.
    pub evade_probe_factor: f32,
    /// Evasion speed as a multiple of speed.
    pub evade_speed_factor: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            evade_health_fraction: 0.3,
            idle_wander_chance: 0.05,
            idle_speed_factor: 0.3,
            seek_stall_chance: 0.05,
            reengage_chance: 0.02,
            attack_recoil_factor: 0.4,
            attack_recoil_ms: 150,
            evade_candidates: 8,
            evade_probe_factor: 1.5,
            evade_speed_factor: 1.2,
        }
    }
}

/// Power-up spawning and payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpConfig {
    /// Delay before the first power-up of a match.
    pub first_spawn_ms: u64,
    /// Window for the delay between subsequent spawns.
    pub spawn_interval: MillisRange,
    /// Keep-out distance from the world edges for spawn positions.
    pub spawn_margin: f32,
    /// An uncollected power-up disappears after this long.
    pub lifespan_ms: u64,
    /// Targeting ignores power-ups farther than this.
    pub pickup_radius: f32,
    /// Shield duration.
    pub shield_duration_ms: u64,
    /// Shield multiplies defense by `1 + shield_multiplier`.
    pub shield_multiplier: f32,
    /// Trap slow duration.
    pub trap_duration_ms: u64,
    /// Trap multiplies speed by this.
    pub trap_multiplier: f32,
    /// Immediate damage dealt by a trap.
    pub trap_damage: f32,
    /// Range of chaos durations.
    pub chaos_duration: MillisRange,
    /// Defense factor of the chaos fortify outcome.
    pub chaos_defense_factor: f32,
    /// Interval between confusion heading changes.
    pub confusion_interval_ms: u64,
    /// Health restored by the chaos heal outcome.
    pub chaos_heal: f32,
    /// Damage dealt by the chaos harm outcome.
    pub chaos_damage: f32,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            first_spawn_ms: 5000,
            spawn_interval: MillisRange::new(8000, 15000),
            spawn_margin: 50.0,
            lifespan_ms: 10_000,
            pickup_radius: 300.0,
            shield_duration_ms: 8000,
            shield_multiplier: 0.5,
            trap_duration_ms: 3000,
            trap_multiplier: 0.5,
            trap_damage: 10.0,
            chaos_duration: MillisRange::new(3000, 10_000),
            chaos_defense_factor: 10.0,
            confusion_interval_ms: 500,
            chaos_heal: 50.0,
            chaos_damage: 30.0,
        }
    }
}

/// Hazard spawning and behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    /// Delay before the first hazard of a match.
    pub first_spawn_ms: u64,
    /// Window for the delay between subsequent spawns.
    pub spawn_interval: MillisRange,
    /// Spike wall travel speed.
    pub spike_speed: f32,
    /// Spike wall contact damage (lethal).
    pub spike_damage: f32,
    /// Half thickness of a spike wall.
    pub spike_half_thickness: f32,
    /// Half length of a spike wall.
    pub spike_half_length: f32,
    /// Initial fall speed of a fireball.
    pub fireball_speed: StatRange,
    /// Initial horizontal drift of a fireball.
    pub fireball_drift: StatRange,
    /// Downward acceleration applied to fireballs.
    pub fireball_gravity: f32,
    /// Fireball contact damage, floored to a whole number.
    pub fireball_damage: StatRange,
    /// Fireball collision radius.
    pub fireball_radius: f32,
    /// A fireball that hits nobody disappears after this long.
    pub fireball_lifespan_ms: u64,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            first_spawn_ms: 15_000,
            spawn_interval: MillisRange::new(10_000, 20_000),
            spike_speed: 200.0,
            spike_damage: 1000.0,
            spike_half_thickness: 8.0,
            spike_half_length: 80.0,
            fireball_speed: StatRange::new(150.0, 250.0),
            fireball_drift: StatRange::new(-50.0, 50.0),
            fireball_gravity: 200.0,
            fireball_damage: StatRange::new(25.0, 40.0),
            fireball_radius: 16.0,
            fireball_lifespan_ms: 6000,
        }
    }
}

/// Match lifecycle and viewer economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Gladiators spawned per match.
    pub gladiator_count: usize,
    /// Match length in seconds.
    pub duration_s: u32,
    /// Interval of one countdown step.
    pub countdown_step_ms: u64,
    /// Seconds between match end and the next match.
    pub reset_delay_s: u32,
    /// MVP ballot window.
    pub mvp_window_ms: u64,
    /// MVP ballot window after the first manual vote.
    pub mvp_post_vote_window_ms: u64,
    /// Token cost of an MVP vote.
    pub mvp_vote_cost: u64,
    /// Reward multiplier applied to correct predictions.
    pub reward_multiplier: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            gladiator_count: 4,
            duration_s: 60,
            countdown_step_ms: 1000,
            reset_delay_s: 5,
            mvp_window_ms: 15_000,
            mvp_post_vote_window_ms: 5000,
            mvp_vote_cost: 1,
            reward_multiplier: 2,
        }
    }
}

// =============================================================================
// ArenaConfig
// =============================================================================

/// Complete simulation configuration.
///
/// # Example
///
/// ```
/// use gladiator_core::config::ArenaConfig;
///
/// let mut config = ArenaConfig::default();
/// config.matches.gladiator_count = 6;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// World geometry.
    pub world: WorldConfig,
    /// Stat generation ranges.
    pub stats: StatRanges,
    /// Combat tunables.
    pub combat: CombatConfig,
    /// Decision tunables.
    pub behavior: BehaviorConfig,
    /// Power-up tunables.
    pub power_ups: PowerUpConfig,
    /// Hazard tunables.
    pub hazards: HazardConfig,
    /// Lifecycle tunables.
    pub matches: MatchConfig,
}

impl ArenaConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if !(world.width > 0.0 && world.height > 0.0) {
            return Err(ConfigError::EmptyWorld {
                width: world.width,
                height: world.height,
            });
        }
        if world.spawn_margin + world.spawn_zone_size > world.width.min(world.height) / 2.0 {
            return Err(ConfigError::SpawnZonesOverlap);
        }

        let ranges = &self.stats;
        ranges.strength.check("stats.strength")?;
        ranges.speed.check("stats.speed")?;
        ranges.defense.check("stats.defense")?;
        ranges.intelligence.check("stats.intelligence")?;
        ranges.aggression.check("stats.aggression")?;
        ranges.luck.check("stats.luck")?;
        if ranges.aggression.min < 0.0 || ranges.aggression.max > 1.0 {
            return Err(ConfigError::OutOfUnitInterval("stats.aggression"));
        }
        if ranges.luck.min < 0.0 || ranges.luck.max > 1.0 {
            return Err(ConfigError::OutOfUnitInterval("stats.luck"));
        }

        if self.combat.attack_cooldown_ms == 0 {
            return Err(ConfigError::ZeroDuration("combat.attack_cooldown_ms"));
        }
        if self.behavior.evade_candidates == 0 || self.behavior.evade_candidates > 8 {
            return Err(ConfigError::EvadeCandidates(self.behavior.evade_candidates));
        }

        let power_ups = &self.power_ups;
        power_ups.spawn_interval.check("power_ups.spawn_interval")?;
        power_ups.chaos_duration.check("power_ups.chaos_duration")?;
        if power_ups.confusion_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("power_ups.confusion_interval_ms"));
        }

        let hazards = &self.hazards;
        hazards.spawn_interval.check("hazards.spawn_interval")?;
        hazards.fireball_speed.check("hazards.fireball_speed")?;
        hazards.fireball_drift.check("hazards.fireball_drift")?;
        hazards.fireball_damage.check("hazards.fireball_damage")?;

        let matches = &self.matches;
        if matches.gladiator_count < 2 {
            return Err(ConfigError::TooFewGladiators(matches.gladiator_count));
        }
        if matches.duration_s == 0 {
            return Err(ConfigError::ZeroDuration("matches.duration_s"));
        }
        if matches.countdown_step_ms == 0 {
            return Err(ConfigError::ZeroDuration("matches.countdown_step_ms"));
        }
        Ok(())
    }
}
