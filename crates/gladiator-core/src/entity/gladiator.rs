//! Gladiators and their decision state machine.
//!
//! Every tick a live gladiator re-evaluates its [`FsmState`] through an
//! ordered list of rules (first match wins) and then emits a motion intent
//! for that state. The intent is stored as the gladiator's commanded
//! velocity; integrating it is the host's job.
//!
//! # Decision Rules
//!
//! 1. `health < 0.3 * max_health` → [`FsmState::Evade`]
//! 2. power-up target and `roll < intelligence / 3` → [`FsmState::CollectPowerUp`]
//! 3. hostile target and `roll < aggression` → [`FsmState::Attack`] when
//!    closer than the attack range, [`FsmState::Seek`] otherwise
//! 4. currently seeking and `roll < 0.05` → [`FsmState::Idle`]
//! 5. hostile target and `roll < 0.02` → [`FsmState::Seek`]
//! 6. otherwise [`FsmState::Idle`]
//!
//! A knocked-out gladiator never changes state again.

use std::f32::consts::{FRAC_PI_4, TAU};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::stats::{AgentStats, EffectFlags, ModifierId, ModifierStack, StatKind};
use super::EntityId;
use crate::config::{BehaviorConfig, CombatConfig, StatRanges};

/// Behavioral mode of a gladiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FsmState {
    /// Wandering slowly.
    #[default]
    Idle,
    /// Closing in on the hostile target.
    Seek,
    /// Standing ground and striking on cooldown.
    Attack,
    /// Fleeing from the hostile target.
    Evade,
    /// Heading for a power-up.
    CollectPowerUp,
}

/// What a gladiator can see of one of its targets this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Sighting {
    /// No target assigned.
    #[default]
    None,
    /// Target assigned and still live.
    Live {
        /// Target id.
        id: EntityId,
        /// Target position.
        position: Vec2,
    },
    /// Target assigned but destroyed since assignment.
    Stale(EntityId),
}

impl Sighting {
    /// Returns the live target, if any.
    #[must_use]
    pub fn live(&self) -> Option<(EntityId, Vec2)> {
        match *self {
            Self::Live { id, position } => Some((id, position)),
            _ => None,
        }
    }

    /// Returns true if the reference points at a destroyed entity.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }
}

/// Read-only view of the world handed to [`Gladiator::update`].
#[derive(Debug, Clone)]
pub struct Perception<'a> {
    /// Current simulation time.
    pub now_ms: u64,
    /// Hostile target.
    pub target: Sighting,
    /// Beneficial target.
    pub power_up: Sighting,
    /// Positions of every other live gladiator.
    pub neighbours: &'a [Vec2],
    /// World size; the world spans `[0, size.x] x [0, size.y]`.
    pub world: Vec2,
}

/// Actions requested by a gladiator beyond its own velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Intent {
    /// Attack this gladiator now; the cooldown has already been consumed.
    pub strike: Option<EntityId>,
}

/// An autonomous combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gladiator {
    id: EntityId,
    name: String,
    stats: AgentStats,
    modifiers: ModifierStack,
    state: FsmState,
    position: Vec2,
    velocity: Vec2,
    target: Option<EntityId>,
    power_up_target: Option<EntityId>,
    last_attack_ms: Option<u64>,
    attack_cooldown_ms: u64,
    confused_until_ms: Option<u64>,
    recoil_until_ms: Option<u64>,
    knocked_out: bool,
}

impl Gladiator {
    /// Creates an idle gladiator at full health.
    #[must_use]
    pub fn new(id: EntityId, stats: AgentStats, position: Vec2, attack_cooldown_ms: u64) -> Self {
        Self {
            id,
            name: format!("Gladiator {}", id.as_u64() + 1),
            stats,
            modifiers: ModifierStack::default(),
            state: FsmState::Idle,
            position,
            velocity: Vec2::ZERO,
            target: None,
            power_up_target: None,
            last_attack_ms: None,
            attack_cooldown_ms,
            confused_until_ms: None,
            recoil_until_ms: None,
            knocked_out: false,
        }
    }

    /// Replaces the default display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base stats and health.
    #[must_use]
    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Stats with all active modifiers applied.
    #[must_use]
    pub fn effective_stats(&self) -> AgentStats {
        self.modifiers.apply(&self.stats)
    }

    /// Effective value of one stat.
    #[must_use]
    pub fn effective(&self, kind: StatKind) -> f32 {
        self.stats.get(kind) * self.modifiers.factor(kind)
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.stats.health
    }

    /// Current decision state.
    #[must_use]
    pub fn state(&self) -> FsmState {
        self.state
    }

    /// Current position, as last reported by the host.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Records the position reported by the host.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Commanded velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Overrides the commanded velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Hostile target id.
    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Beneficial target id.
    #[must_use]
    pub fn power_up_target(&self) -> Option<EntityId> {
        self.power_up_target
    }

    /// Assigns both targets; ignored once knocked out.
    pub fn set_targets(&mut self, target: Option<EntityId>, power_up: Option<EntityId>) {
        if self.knocked_out {
            return;
        }
        self.target = target;
        self.power_up_target = power_up;
    }

    /// Returns true until the gladiator is knocked out.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.knocked_out
    }

    /// Timed effects currently acting on the gladiator.
    #[must_use]
    pub fn flags(&self, now_ms: u64) -> EffectFlags {
        let mut flags = self.modifiers.flags();
        if self.is_confused(now_ms) {
            flags |= EffectFlags::CONFUSED;
        }
        flags
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Applies damage. Returns true if this hit knocked the gladiator out.
    ///
    /// Health never drops below zero, and a knocked-out gladiator ignores
    /// further damage.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.knocked_out || amount <= 0.0 {
            return false;
        }
        self.stats.health = (self.stats.health - amount).max(0.0);
        if self.stats.health <= 0.0 {
            self.knock_out();
            return true;
        }
        false
    }

    /// Restores health up to max health.
    pub fn heal(&mut self, amount: f32) {
        if self.knocked_out || amount <= 0.0 {
            return;
        }
        self.stats.health = (self.stats.health + amount).min(self.stats.max_health);
    }

    fn knock_out(&mut self) {
        self.knocked_out = true;
        self.velocity = Vec2::ZERO;
        self.target = None;
        self.power_up_target = None;
        self.confused_until_ms = None;
        self.modifiers.clear();
    }

    /// Adds a timed stat modifier. Returns `None` once knocked out.
    pub fn add_modifier(
        &mut self,
        stat: StatKind,
        factor: f32,
        source: EffectFlags,
    ) -> Option<ModifierId> {
        if self.knocked_out {
            return None;
        }
        Some(self.modifiers.push(stat, factor, source))
    }

    /// Reverts a timed stat modifier.
    pub fn remove_modifier(&mut self, id: ModifierId) -> bool {
        self.modifiers.remove(id)
    }

    /// Scrambles movement until `until_ms`; overlapping confusions extend it.
    pub fn confuse_until(&mut self, until_ms: u64) {
        if self.knocked_out {
            return;
        }
        self.confused_until_ms = Some(self.confused_until_ms.map_or(until_ms, |u| u.max(until_ms)));
    }

    /// Returns true while a confusion effect is running.
    #[must_use]
    pub fn is_confused(&self, now_ms: u64) -> bool {
        self.confused_until_ms.is_some_and(|until| now_ms < until)
    }

    /// Points the gladiator in a random direction at `speed_factor * speed`.
    pub fn random_heading<R: Rng + ?Sized>(&mut self, speed_factor: f32, rng: &mut R) {
        if self.knocked_out {
            return;
        }
        let speed = self.effective(StatKind::Speed) * speed_factor;
        self.velocity = Vec2::from_angle(rng.gen::<f32>() * TAU) * speed;
    }

    /// Knocks an attacking gladiator off its spot in a random direction at
    /// `speed_factor * speed` until `until_ms`. Returns false, changing
    /// nothing, unless the gladiator is in [`FsmState::Attack`].
    pub fn recoil<R: Rng + ?Sized>(
        &mut self,
        speed_factor: f32,
        until_ms: u64,
        rng: &mut R,
    ) -> bool {
        if self.knocked_out || self.state != FsmState::Attack {
            return false;
        }
        self.random_heading(speed_factor, rng);
        self.recoil_until_ms = Some(until_ms);
        true
    }

    /// Returns true while a post-attack recoil holds the velocity.
    #[must_use]
    pub fn is_recoiling(&self, now_ms: u64) -> bool {
        self.recoil_until_ms.is_some_and(|until| now_ms < until)
    }

    /// Returns true if the attack cooldown has elapsed.
    #[must_use]
    pub fn cooldown_ready(&self, now_ms: u64) -> bool {
        self.last_attack_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= self.attack_cooldown_ms)
    }

    /// Consumes the cooldown for a strike against `defender` if the gladiator
    /// is attacking that exact target and is off cooldown.
    pub fn try_begin_strike(&mut self, defender: EntityId, now_ms: u64) -> bool {
        if self.knocked_out
            || self.state != FsmState::Attack
            || self.target != Some(defender)
            || !self.cooldown_ready(now_ms)
        {
            return false;
        }
        self.last_attack_ms = Some(now_ms);
        true
    }

    /// Regenerates a malformed stat block. Returns true if it had to.
    pub fn repair_stats<R: Rng + ?Sized>(&mut self, ranges: &StatRanges, rng: &mut R) -> bool {
        if self.stats.is_well_formed() {
            return false;
        }
        tracing::warn!(
            gladiator = %self.id,
            stats = ?self.stats,
            "malformed stat block regenerated"
        );
        self.stats = AgentStats::generate(ranges, rng);
        self.modifiers.clear();
        true
    }

    // -------------------------------------------------------------------------
    // Decision
    // -------------------------------------------------------------------------

    /// Runs one decision tick.
    ///
    /// Re-evaluates the state, updates the commanded velocity and reports a
    /// strike if the attack cooldown allowed one. If either assigned target
    /// was destroyed since assignment the tick is a no-op; targeting will
    /// reassign next tick.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        perception: &Perception<'_>,
        combat: &CombatConfig,
        behavior: &BehaviorConfig,
        rng: &mut R,
    ) -> Intent {
        if self.knocked_out {
            return Intent::default();
        }
        if perception.target.is_stale() || perception.power_up.is_stale() {
            tracing::trace!(gladiator = %self.id, "stale target reference, skipping tick");
            return Intent::default();
        }

        let next = self.decide(perception, combat, behavior, rng);
        if next != self.state {
            tracing::debug!(gladiator = %self.id, from = ?self.state, to = ?next, "state change");
            self.state = next;
        }

        let speed = self.effective(StatKind::Speed);
        let recoiling = self.is_recoiling(perception.now_ms);
        let mut intent = Intent::default();
        let desired = match self.state {
            FsmState::Idle => (rng.gen::<f32>() < behavior.idle_wander_chance).then(|| {
                Vec2::from_angle(rng.gen::<f32>() * TAU) * speed * behavior.idle_speed_factor
            }),
            FsmState::Seek => perception
                .target
                .live()
                .map(|(_, to)| heading(self.position, to) * speed),
            FsmState::Attack => perception
                .target
                .live()
                .map(|(id, _)| {
                    if self.cooldown_ready(perception.now_ms) {
                        self.last_attack_ms = Some(perception.now_ms);
                        intent.strike = Some(id);
                    }
                    Vec2::ZERO
                })
                .filter(|_| !recoiling),
            FsmState::Evade => perception
                .target
                .live()
                .map(|(_, threat)| self.evade_velocity(threat, perception, behavior)),
            FsmState::CollectPowerUp => perception
                .power_up
                .live()
                .map(|(_, to)| heading(self.position, to) * speed),
        };

        if let Some(velocity) = desired {
            if !self.is_confused(perception.now_ms) {
                self.velocity = velocity;
            }
        }
        intent
    }

    fn decide<R: Rng + ?Sized>(
        &self,
        perception: &Perception<'_>,
        combat: &CombatConfig,
        behavior: &BehaviorConfig,
        rng: &mut R,
    ) -> FsmState {
        let stats = self.effective_stats();

        if stats.health_fraction() < behavior.evade_health_fraction {
            return FsmState::Evade;
        }

        if perception.power_up.live().is_some() && rng.gen::<f32>() < stats.intelligence / 3.0 {
            return FsmState::CollectPowerUp;
        }

        let target = perception.target.live();
        if let Some((_, position)) = target {
            if rng.gen::<f32>() < stats.aggression {
                return if self.position.distance(position) < combat.attack_range {
                    FsmState::Attack
                } else {
                    FsmState::Seek
                };
            }
        }

        if self.state == FsmState::Seek && rng.gen::<f32>() < behavior.seek_stall_chance {
            return FsmState::Idle;
        }

        if target.is_some() && rng.gen::<f32>() < behavior.reengage_chance {
            return FsmState::Seek;
        }

        FsmState::Idle
    }

    /// Picks the escape point farthest from every other gladiator.
    ///
    /// Probes points at `probe_factor * speed` in 45° steps starting directly
    /// away from the threat, skipping points outside the world. Falls back
    /// to fleeing straight away from the threat.
    fn evade_velocity(
        &self,
        threat: Vec2,
        perception: &Perception<'_>,
        behavior: &BehaviorConfig,
    ) -> Vec2 {
        let speed = self.effective(StatKind::Speed);
        let flee_speed = speed * behavior.evade_speed_factor;
        let away = heading(threat, self.position);
        let base_angle = if away == Vec2::ZERO { 0.0 } else { away.y.atan2(away.x) };
        let probe = speed * behavior.evade_probe_factor;

        let mut best: Option<(f32, Vec2)> = None;
        for step in 0..behavior.evade_candidates.min(8) {
            let angle = base_angle + f32::from(step) * FRAC_PI_4;
            let point = self.position + Vec2::from_angle(angle) * probe;
            let world = perception.world;
            if point.x < 0.0 || point.y < 0.0 || point.x > world.x || point.y > world.y {
                continue;
            }
            let score = perception
                .neighbours
                .iter()
                .map(|n| n.distance(point))
                .fold(f32::INFINITY, f32::min);
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, point));
            }
        }

        match best {
            Some((_, point)) => heading(self.position, point) * flee_speed,
            None => away * flee_speed,
        }
    }

    /// Serializable read-only view.
    #[must_use]
    pub fn snapshot(&self, now_ms: u64) -> GladiatorSnapshot {
        GladiatorSnapshot {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            velocity: self.velocity,
            state: self.state,
            health: self.stats.health,
            max_health: self.stats.max_health,
            stats: self.effective_stats(),
            flags: self.flags(now_ms),
            active: self.is_active(),
        }
    }
}

/// Unit vector from `from` to `to`, zero if they coincide.
fn heading(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Read-only gladiator state for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GladiatorSnapshot {
    /// Entity id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Last reported position.
    pub position: Vec2,
    /// Commanded velocity.
    pub velocity: Vec2,
    /// Decision state.
    pub state: FsmState,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Effective stats.
    pub stats: AgentStats,
    /// Active timed effects.
    pub flags: EffectFlags,
    /// False once knocked out.
    pub active: bool,
}
