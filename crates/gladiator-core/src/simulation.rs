//! Simulation module: the arena orchestrator.
//!
//! The [`Simulation`] owns the live match and everything in it and is
//! driven by a host loop calling [`Simulation::tick`] at a fixed rate. Each
//! tick runs in a fixed order:
//!
//! 1. **TASKS**: fire every deferred [`Task`] that is due (reversals,
//!    recoil, removals, countdown, spawns, reset)
//! 2. **TARGETING**: assign nearest hostile and power-up targets
//! 3. **AGENTS**: run each live gladiator's state machine in id order and
//!    resolve the strikes it requests
//! 4. **HAZARDS**: move hazards and drop those that left the world
//! 5. **TERMINATION**: end the match if at most one gladiator is left or
//!    the countdown ran out
//! 6. **COMMANDS**: emit one desired velocity per gladiator for the host
//!
//! Between ticks the host reports positions with
//! [`Simulation::sync_position`] and overlaps with
//! [`Simulation::handle_contact`].
//!
//! # Liveness
//!
//! Deferred tasks name the entity they act on by id. When a task fires, the
//! id is resolved through the [`Arena`] and the task is dropped if the
//! entity is gone or knocked out. Resetting the arena advances the
//! scheduler epoch, which discards every task of the old match at once.
//!
//! # Example
//!
//! ```
//! use gladiator_core::config::ArenaConfig;
//! use gladiator_core::lifecycle::MatchState;
//! use gladiator_core::prediction::InMemoryLedger;
//! use gladiator_core::simulation::Simulation;
//!
//! let ledger = Box::new(InMemoryLedger::new());
//! let mut sim = Simulation::with_seed(ArenaConfig::default(), ledger, 7)?;
//! sim.start(0);
//!
//! for step in 1..=10 {
//!     let commands = sim.tick(step * 16);
//!     assert_eq!(commands.len(), 4);
//! }
//! assert_eq!(sim.match_state(), MatchState::Running);
//! # Ok::<(), gladiator_core::error::ConfigError>(())
//! ```

use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::arena::Arena;
use crate::config::ArenaConfig;
use crate::effects::{hazard, power_up, spawner, Effect, EffectKind, EffectSnapshot, SpawnTimer};
use crate::entity::{AgentStats, EntityId, Gladiator, GladiatorSnapshot, Perception, Sighting};
use crate::error::{ConfigError, LedgerError, PredictionError, VoteError};
use crate::host::Contact;
use crate::lifecycle::{determine_winner, EndReason, Match, MatchResult, MatchSnapshot, MatchState};
use crate::mvp::{MvpBallot, MvpResult};
use crate::output::{Command, Event, EventLog};
use crate::prediction::{distribute_rewards, Ledger, PredictionBook};
use crate::resolver::{CombatResolver, TargetingResolver};
use crate::scheduler::{Scheduler, Task};

/// Longest time step applied to hazard motion in one tick, in seconds.
const MAX_STEP_S: f32 = 0.25;

// =============================================================================
// Simulation
// =============================================================================

/// The arena orchestrator.
///
/// Owns the arena, the scheduler, the live match and the viewer-facing
/// prediction book and MVP ballot. The token ledger is injected at
/// construction.
pub struct Simulation {
    config: ArenaConfig,
    arena: Arena,
    scheduler: Scheduler,
    current: Match,
    next_match_id: u64,
    started: bool,
    events: EventLog,
    ledger: Box<dyn Ledger + Send>,
    predictions: PredictionBook,
    ballot: Option<MvpBallot>,
    last_result: Option<MatchResult>,
    last_mvp: Option<MvpResult>,
    power_ups: SpawnTimer,
    hazards: SpawnTimer,
    targeting: TargetingResolver,
    combat: CombatResolver,
    rng: ChaCha8Rng,
    now_ms: u64,
    last_tick_ms: Option<u64>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("match", &self.current)
            .field("arena", &self.arena)
            .field("pending_tasks", &self.scheduler.pending())
            .field("events", &self.events.len())
            .field("ballot", &self.ballot)
            .field("now_ms", &self.now_ms)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a simulation seeded from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] if the configuration is invalid.
    pub fn new(config: ArenaConfig, ledger: Box<dyn Ledger + Send>) -> Result<Self, ConfigError> {
        Self::with_rng(config, ledger, ChaCha8Rng::from_entropy())
    }

    /// Creates a simulation with a fixed RNG seed.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] if the configuration is invalid.
    pub fn with_seed(
        config: ArenaConfig,
        ledger: Box<dyn Ledger + Send>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(config, ledger, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(
        config: ArenaConfig,
        ledger: Box<dyn Ledger + Send>,
        rng: ChaCha8Rng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let power_ups = SpawnTimer::new(
            config.power_ups.first_spawn_ms,
            config.power_ups.spawn_interval,
        );
        let hazards = SpawnTimer::new(config.hazards.first_spawn_ms, config.hazards.spawn_interval);
        let targeting = TargetingResolver::new(config.power_ups.pickup_radius);
        Ok(Self {
            current: Match::new(0, config.matches.duration_s, 0),
            config,
            arena: Arena::new(),
            scheduler: Scheduler::new(),
            next_match_id: 1,
            started: false,
            events: EventLog::new(),
            ledger,
            predictions: PredictionBook::new(),
            ballot: None,
            last_result: None,
            last_mvp: None,
            power_ups,
            hazards,
            targeting,
            combat: CombatResolver::new(),
            rng,
            now_ms: 0,
            last_tick_ms: None,
        })
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Starts the first match. Does nothing if already started.
    pub fn start(&mut self, now_ms: u64) {
        if self.started {
            return;
        }
        self.started = true;
        self.now_ms = now_ms;
        self.last_tick_ms = Some(now_ms);
        self.start_match(now_ms);
    }

    /// Tears everything down and cancels all pending tasks.
    ///
    /// Open predictions are dropped unsettled and an open MVP ballot is
    /// discarded. The simulation can be started again afterwards.
    pub fn dispose(&mut self) {
        self.arena.clear();
        self.scheduler.advance_epoch();
        self.predictions.clear();
        self.ballot = None;
        self.started = false;
        self.last_tick_ms = None;
        tracing::info!(match_id = self.current.id(), "simulation disposed");
    }

    fn start_match(&mut self, now_ms: u64) {
        let match_id = self.next_match_id;
        self.next_match_id += 1;
        self.current = Match::new(match_id, self.config.matches.duration_s, now_ms);

        let cooldown = self.config.combat.attack_cooldown_ms;
        let mut participants = Vec::with_capacity(self.config.matches.gladiator_count);
        for index in 0..self.config.matches.gladiator_count {
            let stats = AgentStats::generate(&self.config.stats, &mut self.rng);
            let position = spawner::spawn_point(index, &self.config.world, &mut self.rng);
            let id = self.arena.spawn_gladiator(|id| {
                Gladiator::new(id, stats, position, cooldown)
                    .with_name(format!("Gladiator {}", index + 1))
            });
            participants.push(id);
        }

        let step = self.config.matches.countdown_step_ms;
        self.scheduler.schedule(now_ms, step, Task::CountdownStep);
        self.scheduler
            .schedule(now_ms, self.power_ups.first_delay(), Task::SpawnPowerUp);
        self.scheduler
            .schedule(now_ms, self.hazards.first_delay(), Task::SpawnHazard);

        self.current.begin_running(participants.clone());
        tracing::info!(match_id, gladiators = participants.len(), "match started");
        self.events.push(Event::MatchStarted {
            match_id,
            gladiators: participants,
        });
    }

    fn end_match(&mut self, reason: EndReason, now_ms: u64) {
        if !self
            .current
            .begin_ending(now_ms, self.config.matches.reset_delay_s)
        {
            return;
        }

        for gladiator in self.arena.gladiators_mut() {
            gladiator.set_velocity(Vec2::ZERO);
        }

        let standing: Vec<(EntityId, f32)> = self
            .arena
            .active_gladiators()
            .map(|g| (g.id(), g.health()))
            .collect();
        let winner = determine_winner(reason, &standing);
        let match_id = self.current.id();
        let stats = self.current.stats();
        let duration_s = self.current.duration_s(now_ms);
        let predictions = self.predictions.settle(winner);

        tracing::info!(match_id, ?winner, ?reason, duration_s, "match ended");
        self.events.push(Event::MatchEnd {
            match_id,
            winner,
            reason,
            stats,
            duration_s,
        });

        let participants = self.current.participants().to_vec();
        self.open_ballot(match_id, participants.clone(), now_ms);
        self.last_result = Some(MatchResult {
            match_id,
            winner,
            reason,
            duration_s,
            stats,
            participants,
            predictions,
        });

        self.scheduler
            .schedule(now_ms, self.config.matches.countdown_step_ms, Task::ResetStep);
    }

    fn reset(&mut self, now_ms: u64) {
        self.current.begin_resetting();
        tracing::info!(match_id = self.current.id(), "resetting arena");
        self.arena.clear();
        self.scheduler.advance_epoch();
        tracing::debug!(epoch = self.scheduler.epoch(), "stale tasks discarded");
        self.predictions.clear();
        self.start_match(now_ms);
    }

    fn open_ballot(&mut self, match_id: u64, eligible: Vec<EntityId>, now_ms: u64) {
        if let Some(previous) = self.ballot.take() {
            self.finish_ballot(previous);
        }
        self.ballot = Some(MvpBallot::open(
            match_id,
            eligible,
            now_ms,
            self.config.matches.mvp_window_ms,
        ));
    }

    fn poll_ballot(&mut self, now_ms: u64) {
        if self.ballot.as_ref().is_some_and(|b| b.is_due(now_ms)) {
            if let Some(ballot) = self.ballot.take() {
                self.finish_ballot(ballot);
            }
        }
    }

    fn finish_ballot(&mut self, ballot: MvpBallot) {
        let result = ballot.close(&mut self.rng);
        if let Some(gladiator) = result.mvp {
            let votes = result
                .votes_by_gladiator
                .iter()
                .find(|(id, _)| *id == gladiator)
                .map_or(0, |(_, v)| *v);
            tracing::info!(
                match_id = result.match_id,
                %gladiator,
                votes,
                random = result.random,
                "MVP decided"
            );
            self.events.push(Event::MvpDecided {
                match_id: result.match_id,
                gladiator,
                votes,
                random: result.random,
            });
        }
        self.last_mvp = Some(result);
    }

    // -------------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------------

    /// Advances the simulation to `now_ms` and returns the desired velocity
    /// of every gladiator.
    ///
    /// Does nothing but return commands until [`start`](Self::start) has
    /// been called.
    #[allow(clippy::cast_precision_loss)]
    pub fn tick(&mut self, now_ms: u64) -> Vec<Command> {
        if !self.started {
            return Vec::new();
        }
        let dt = self
            .last_tick_ms
            .map_or(0.0, |last| now_ms.saturating_sub(last) as f32 / 1000.0)
            .min(MAX_STEP_S);
        self.now_ms = now_ms;
        self.last_tick_ms = Some(now_ms);

        while let Some(task) = self.scheduler.pop_due(now_ms) {
            self.run_task(task, now_ms);
        }

        if self.current.is_running() {
            self.repair_stats();
            self.targeting.assign(&mut self.arena);
            self.update_agents(now_ms);
            self.step_hazards(dt);
            self.check_termination(now_ms);
        }

        self.poll_ballot(now_ms);
        self.commands()
    }

    fn repair_stats(&mut self) {
        for gladiator in self.arena.gladiators_mut() {
            if gladiator.is_active() {
                gladiator.repair_stats(&self.config.stats, &mut self.rng);
            }
        }
    }

    fn update_agents(&mut self, now_ms: u64) {
        let world = self.config.world.size();
        for id in self.arena.active_ids() {
            let Some(gladiator) = self.arena.active_gladiator(id) else {
                continue;
            };
            let target = match gladiator.target() {
                None => Sighting::None,
                Some(t) => self
                    .arena
                    .active_gladiator(t)
                    .map_or(Sighting::Stale(t), |g| Sighting::Live {
                        id: t,
                        position: g.position(),
                    }),
            };
            let power_up = match gladiator.power_up_target() {
                None => Sighting::None,
                Some(p) => self
                    .arena
                    .effect(p)
                    .filter(|e| e.is_power_up())
                    .map_or(Sighting::Stale(p), |e| Sighting::Live {
                        id: p,
                        position: e.position,
                    }),
            };
            let neighbours: Vec<Vec2> = self
                .arena
                .active_gladiators()
                .filter(|g| g.id() != id)
                .map(Gladiator::position)
                .collect();
            let perception = Perception {
                now_ms,
                target,
                power_up,
                neighbours: &neighbours,
                world,
            };

            let Some(gladiator) = self.arena.active_gladiator_mut(id) else {
                continue;
            };
            let intent = gladiator.update(
                &perception,
                &self.config.combat,
                &self.config.behavior,
                &mut self.rng,
            );
            if let Some(defender) = intent.strike {
                self.strike(id, defender, now_ms);
            }
        }
    }

    fn strike(&mut self, attacker: EntityId, defender: EntityId, now_ms: u64) {
        let Some(report) = self.combat.strike(
            &mut self.arena,
            attacker,
            defender,
            &self.config.combat,
            &mut self.rng,
        ) else {
            return;
        };
        self.current.stats_mut().attacks += 1;
        self.events.push(Event::AttackResolved {
            attacker,
            defender,
            dodged: report.outcome.dodged,
            critical: report.outcome.critical,
            damage: report.outcome.damage,
        });
        self.scheduler.schedule(
            now_ms,
            self.config.combat.break_deadlock_delay_ms,
            Task::BreakDeadlock { agent: attacker },
        );
        if report.knocked_out {
            self.on_knockout(defender, now_ms);
        }
    }

    fn on_knockout(&mut self, gladiator: EntityId, now_ms: u64) {
        self.current.stats_mut().knockouts += 1;
        tracing::debug!(match_id = self.current.id(), %gladiator, "gladiator knocked out");
        self.events.push(Event::KnockedOut { gladiator });
        self.scheduler.schedule(
            now_ms,
            self.config.combat.knockout_grace_ms,
            Task::RemoveAgent { agent: gladiator },
        );
    }

    fn step_hazards(&mut self, dt: f32) {
        let world = &self.config.world;
        let mut gone = Vec::new();
        for effect in self.arena.effects_mut() {
            hazard::step(effect, dt, world);
            if world.is_far_outside(effect.position) {
                gone.push(effect.id);
            }
        }
        for effect in gone {
            if self.arena.despawn_effect(effect).is_some() {
                tracing::debug!(%effect, "hazard left the world");
                self.events.push(Event::HazardRemoved { effect });
            }
        }
    }

    fn check_termination(&mut self, now_ms: u64) {
        if let Some(reason) = self.current.check_termination(self.arena.active_count()) {
            self.end_match(reason, now_ms);
        }
    }

    fn commands(&self) -> Vec<Command> {
        let running = self.current.is_running();
        self.arena
            .gladiators()
            .map(|g| Command::SetVelocity {
                target: g.id(),
                velocity: if running && g.is_active() {
                    g.velocity()
                } else {
                    Vec2::ZERO
                },
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Deferred tasks
    // -------------------------------------------------------------------------

    fn run_task(&mut self, task: Task, now_ms: u64) {
        if let Some(owner) = task.owner() {
            if !self.arena.contains(owner) {
                tracing::trace!(?task, "task owner is gone");
                return;
            }
        }

        match task {
            Task::RevertModifier { agent, modifier } => {
                if let Some(g) = self.arena.active_gladiator_mut(agent) {
                    if g.remove_modifier(modifier) {
                        let modifier = modifier.as_u32();
                        tracing::debug!(gladiator = %agent, modifier, "effect expired");
                    }
                }
            }
            Task::ConfusionTick { agent, until_ms } => {
                if now_ms >= until_ms || !self.current.is_running() {
                    return;
                }
                if let Some(g) = self.arena.active_gladiator_mut(agent) {
                    g.random_heading(1.0, &mut self.rng);
                    let interval = self.config.power_ups.confusion_interval_ms;
                    if now_ms + interval < until_ms {
                        self.scheduler
                            .schedule(now_ms, interval, Task::ConfusionTick { agent, until_ms });
                    }
                }
            }
            Task::BreakDeadlock { agent } => {
                if !self.current.is_running() {
                    return;
                }
                let behavior = &self.config.behavior;
                let until_ms = now_ms.saturating_add(behavior.attack_recoil_ms);
                if let Some(g) = self.arena.active_gladiator_mut(agent) {
                    if g.recoil(behavior.attack_recoil_factor, until_ms, &mut self.rng) {
                        tracing::trace!(gladiator = %agent, "attack recoil");
                    }
                }
            }
            Task::RemoveAgent { agent } => {
                if self.arena.despawn_gladiator(agent).is_some() {
                    tracing::debug!(gladiator = %agent, "knocked-out gladiator removed");
                }
            }
            Task::ExpireEffect { effect } => {
                if let Some(expired) = self.arena.despawn_effect(effect) {
                    tracing::debug!(%effect, kind = ?expired.kind, "effect expired");
                    self.events.push(match expired.kind {
                        EffectKind::PowerUp(_) => Event::PowerUpExpired { effect },
                        EffectKind::Hazard(_) => Event::HazardRemoved { effect },
                    });
                }
            }
            Task::CountdownStep => {
                if !self.current.is_running() {
                    return;
                }
                let remaining_s = self.current.countdown_step();
                self.events.push(Event::CountdownTick { remaining_s });
                if remaining_s > 0 {
                    let step = self.config.matches.countdown_step_ms;
                    self.scheduler.schedule(now_ms, step, Task::CountdownStep);
                }
                self.check_termination(now_ms);
            }
            Task::SpawnPowerUp => {
                if !self.current.is_running() {
                    return;
                }
                self.spawn_power_up(now_ms);
                let delay = self.power_ups.next_delay(&mut self.rng);
                self.scheduler.schedule(now_ms, delay, Task::SpawnPowerUp);
            }
            Task::SpawnHazard => {
                if !self.current.is_running() {
                    return;
                }
                self.spawn_hazard(now_ms);
                let delay = self.hazards.next_delay(&mut self.rng);
                self.scheduler.schedule(now_ms, delay, Task::SpawnHazard);
            }
            Task::ResetStep => {
                if self.current.state() != MatchState::Ending {
                    return;
                }
                let remaining_s = self.current.reset_step();
                self.events.push(Event::ResetCountdown { remaining_s });
                if remaining_s == 0 {
                    self.reset(now_ms);
                } else {
                    self.scheduler
                        .schedule(now_ms, self.config.matches.countdown_step_ms, Task::ResetStep);
                }
            }
        }
    }

    fn spawn_power_up(&mut self, now_ms: u64) {
        let world = self.config.world.size();
        let config = &self.config.power_ups;
        let rng = &mut self.rng;
        let id = self
            .arena
            .spawn_effect(|id| power_up::spawn(id, world, config, now_ms, rng));
        self.track_effect(id, now_ms);
    }

    fn spawn_hazard(&mut self, now_ms: u64) {
        let world = &self.config.world;
        let config = &self.config.hazards;
        let rng = &mut self.rng;
        let id = self
            .arena
            .spawn_effect(|id| hazard::spawn(id, world, config, now_ms, rng));
        self.track_effect(id, now_ms);
    }

    fn track_effect(&mut self, id: EntityId, now_ms: u64) {
        let Some(effect) = self.arena.effect(id) else {
            return;
        };
        let (kind, position, lifespan) = (effect.kind, effect.position, effect.lifespan_ms);
        tracing::debug!(effect = %id, ?kind, x = position.x, y = position.y, "effect spawned");
        self.events.push(match kind {
            EffectKind::PowerUp(kind) => Event::PowerUpSpawned {
                effect: id,
                kind,
                position,
            },
            EffectKind::Hazard(kind) => Event::HazardSpawned {
                effect: id,
                kind,
                position,
            },
        });
        if let Some(lifespan) = lifespan {
            self.scheduler
                .schedule(now_ms, lifespan, Task::ExpireEffect { effect: id });
        }
    }

    // -------------------------------------------------------------------------
    // Host input
    // -------------------------------------------------------------------------

    /// Records the position of a gladiator as integrated by the host.
    pub fn sync_position(&mut self, gladiator: EntityId, position: Vec2) {
        if let Some(g) = self.arena.gladiator_mut(gladiator) {
            g.set_position(position);
        }
    }

    /// Handles an overlap reported by the host.
    ///
    /// Ignored unless the match is running and every party is still live.
    pub fn handle_contact(&mut self, contact: Contact) {
        if !self.current.is_running() {
            return;
        }
        let now_ms = self.now_ms;
        match contact {
            Contact::Gladiators(a, b) => {
                for (attacker, defender) in [(a, b), (b, a)] {
                    let ready = self
                        .arena
                        .active_gladiator_mut(attacker)
                        .is_some_and(|g| g.try_begin_strike(defender, now_ms));
                    if ready {
                        self.strike(attacker, defender, now_ms);
                    }
                }
            }
            Contact::PowerUp { gladiator, effect } => {
                self.collect_power_up(gladiator, effect, now_ms);
            }
            Contact::Hazard { gladiator, effect } => self.trigger_hazard(gladiator, effect),
        }
    }

    fn collect_power_up(&mut self, gladiator: EntityId, effect: EntityId, now_ms: u64) {
        if self.arena.active_gladiator(gladiator).is_none() {
            return;
        }
        let Some((kind, payload)) = self
            .arena
            .effect(effect)
            .and_then(|e| e.power_up_kind().map(|k| (k, e.payload)))
        else {
            return;
        };
        self.arena.despawn_effect(effect);

        let Some(g) = self.arena.active_gladiator_mut(gladiator) else {
            return;
        };
        let config = &self.config.power_ups;
        let applied = power_up::apply(g, kind, &payload, config, now_ms, &mut self.rng);
        for (delay, task) in applied.follow_ups {
            self.scheduler.schedule(now_ms, delay, task);
        }
        self.current.stats_mut().power_ups_collected += 1;
        self.events.push(Event::PowerUpCollected {
            gladiator,
            effect,
            kind,
            chaos: applied.chaos,
        });
        if applied.knocked_out {
            self.on_knockout(gladiator, now_ms);
        }
    }

    fn trigger_hazard(&mut self, gladiator: EntityId, effect: EntityId) {
        let Some(hazard_effect) = self
            .arena
            .effect(effect)
            .filter(|e| !e.is_power_up())
            .cloned()
        else {
            return;
        };
        let Some(kind) = hazard_effect.hazard_kind() else {
            return;
        };
        let Some(g) = self.arena.active_gladiator_mut(gladiator) else {
            return;
        };
        let hit = hazard::apply(g, &hazard_effect);
        self.current.stats_mut().hazards_triggered += 1;
        self.events.push(Event::HazardTriggered {
            gladiator,
            effect,
            kind,
            damage: hit.damage,
        });
        if hit.consumed {
            self.arena.despawn_effect(effect);
        }
        if hit.knocked_out {
            self.on_knockout(gladiator, self.now_ms);
        }
    }

    // -------------------------------------------------------------------------
    // Viewer input
    // -------------------------------------------------------------------------

    /// Marks a gladiator as followed by a viewer. Returns false if unknown.
    pub fn select_gladiator(&mut self, gladiator: EntityId) -> bool {
        if self.arena.gladiator(gladiator).is_none() {
            return false;
        }
        self.events.push(Event::GladiatorSelected { gladiator });
        true
    }

    /// Stakes `amount` tokens of `voter` on `gladiator` winning.
    ///
    /// # Errors
    ///
    /// [`PredictionError::MatchNotRunning`] outside a running match,
    /// [`PredictionError::UnknownGladiator`] for anyone not still fighting,
    /// or the booking/ledger failure.
    pub fn place_prediction(
        &mut self,
        voter: &str,
        gladiator: EntityId,
        amount: u64,
    ) -> Result<(), PredictionError> {
        if !self.current.is_running() {
            return Err(PredictionError::MatchNotRunning);
        }
        if self.arena.active_gladiator(gladiator).is_none() {
            return Err(PredictionError::UnknownGladiator(gladiator));
        }
        self.predictions
            .place(&mut *self.ledger, voter, gladiator, amount)?;
        self.events.push(Event::PredictionMade {
            gladiator,
            amount,
            voter: voter.to_string(),
        });
        Ok(())
    }

    /// Casts an MVP vote in the open ballot.
    ///
    /// # Errors
    ///
    /// [`VoteError::NotActive`] if no ballot is open, or the ballot failure.
    pub fn cast_mvp_vote(&mut self, voter: &str, gladiator: EntityId) -> Result<(), VoteError> {
        let ballot = self.ballot.as_mut().ok_or(VoteError::NotActive)?;
        ballot.cast(
            &mut *self.ledger,
            voter,
            gladiator,
            self.config.matches.mvp_vote_cost,
            self.now_ms,
            self.config.matches.mvp_post_vote_window_ms,
        )
    }

    /// Pays the configured reward multiple to every correct prediction of
    /// a finished match. Returns the total paid.
    ///
    /// # Errors
    ///
    /// Stops at the first ledger failure.
    pub fn pay_rewards(&mut self, result: &MatchResult) -> Result<u64, LedgerError> {
        distribute_rewards(
            &mut *self.ledger,
            &result.predictions,
            self.config.matches.reward_multiplier,
        )
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Drains buffered events.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take()
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Read-only arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable arena, for host setup and tests.
    #[must_use]
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// The token ledger.
    #[must_use]
    pub fn ledger(&self) -> &dyn Ledger {
        &*self.ledger
    }

    /// Id of the live match.
    #[must_use]
    pub fn match_id(&self) -> u64 {
        self.current.id()
    }

    /// Phase of the live match.
    #[must_use]
    pub fn match_state(&self) -> MatchState {
        self.current.state()
    }

    /// Time of the last tick.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Deferred tasks waiting to fire.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Result of the most recently ended match.
    #[must_use]
    pub fn last_result(&self) -> Option<&MatchResult> {
        self.last_result.as_ref()
    }

    /// Result of the most recently closed MVP ballot.
    #[must_use]
    pub fn last_mvp(&self) -> Option<&MvpResult> {
        self.last_mvp.as_ref()
    }

    /// The open MVP ballot, if any.
    #[must_use]
    pub fn ballot(&self) -> Option<&MvpBallot> {
        self.ballot.as_ref()
    }

    /// Effective stats of a gladiator.
    #[must_use]
    pub fn gladiator_stats(&self, gladiator: EntityId) -> Option<AgentStats> {
        self.arena.gladiator(gladiator).map(Gladiator::effective_stats)
    }

    /// Current health of a gladiator.
    #[must_use]
    pub fn health(&self, gladiator: EntityId) -> Option<f32> {
        self.arena.gladiator(gladiator).map(Gladiator::health)
    }

    /// Snapshot of the live match.
    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            match_id: self.current.id(),
            state: self.current.state(),
            time_remaining_s: self.current.time_remaining_s(),
            live_count: self.arena.active_count(),
            stats: self.current.stats(),
        }
    }

    /// Snapshots of every gladiator present, in id order.
    #[must_use]
    pub fn gladiator_snapshots(&self) -> Vec<GladiatorSnapshot> {
        self.arena
            .gladiators()
            .map(|g| g.snapshot(self.now_ms))
            .collect()
    }

    /// Snapshots of every effect present, in id order.
    #[must_use]
    pub fn effect_snapshots(&self) -> Vec<EffectSnapshot> {
        self.arena.effects().map(Effect::snapshot).collect()
    }
}
