//! Setup utilities for simulation tests.

use glam::Vec2;

use crate::config::ArenaConfig;
use crate::effects::{Effect, EffectKind, Payload, PowerUpKind};
use crate::entity::EntityId;
use crate::host::KinematicHost;
use crate::output::Event;
use crate::prediction::InMemoryLedger;
use crate::simulation::Simulation;

/// Starting balance of every funded test account.
pub const FUNDS: u64 = 100;

/// Accounts funded by [`ledger`].
pub const VOTERS: [&str; 3] = ["alice", "bob", "carol"];

/// A ledger holding [`FUNDS`] for each of [`VOTERS`].
pub fn ledger() -> InMemoryLedger {
    let mut ledger = InMemoryLedger::new();
    for voter in VOTERS {
        ledger.mint(voter, FUNDS);
    }
    ledger
}

/// A seeded simulation, not yet started.
pub fn simulation_with(config: ArenaConfig, seed: u64) -> Simulation {
    Simulation::with_seed(config, Box::new(ledger()), seed).expect("valid config")
}

/// A seeded simulation with the default config, started at time zero.
pub fn started(seed: u64) -> Simulation {
    let mut sim = simulation_with(ArenaConfig::default(), seed);
    sim.start(0);
    sim
}

/// Ids of the gladiators still fighting.
pub fn live_ids(sim: &Simulation) -> Vec<EntityId> {
    sim.arena().active_ids()
}

/// Sets a gladiator's health by applying the difference as damage.
pub fn set_health(sim: &mut Simulation, id: EntityId, health: f32) {
    let g = sim.arena_mut().gladiator_mut(id).expect("gladiator exists");
    let delta = g.health() - health;
    if delta > 0.0 {
        g.take_damage(delta);
    } else {
        g.heal(-delta);
    }
}

/// Knocks a gladiator out directly.
pub fn knock_out(sim: &mut Simulation, id: EntityId) {
    let g = sim.arena_mut().gladiator_mut(id).expect("gladiator exists");
    g.take_damage(g.health());
}

/// Ticks without a physics host from `from_ms` (exclusive) to `to_ms`
/// (inclusive) in `step_ms` increments, collecting every event.
pub fn tick_until(sim: &mut Simulation, from_ms: u64, to_ms: u64, step_ms: u64) -> Vec<Event> {
    let mut events = Vec::new();
    let mut now = from_ms;
    while now < to_ms {
        now = (now + step_ms).min(to_ms);
        sim.tick(now);
        events.extend(sim.take_events());
    }
    events
}

/// Runs the simulation with a [`KinematicHost`] and calls `inspect` after
/// every frame with the events of that frame.
pub fn run_hosted(
    sim: &mut Simulation,
    frames: u64,
    frame_ms: u64,
    mut inspect: impl FnMut(&Simulation, &[Event]),
) {
    let mut host = KinematicHost::new(sim.config().world.clone());
    #[allow(clippy::cast_precision_loss)]
    let dt = frame_ms as f32 / 1000.0;
    let start = sim.now_ms();
    for frame in 1..=frames {
        let commands = sim.tick(start + frame * frame_ms);
        host.apply(&commands);
        host.step(sim, dt);
        let events = sim.take_events();
        inspect(sim, &events);
    }
}

/// Places a power-up of `kind` under a gladiator.
pub fn drop_power_up(
    sim: &mut Simulation,
    kind: PowerUpKind,
    at: Vec2,
    payload: Payload,
) -> EntityId {
    let now = sim.now_ms();
    sim.arena_mut().spawn_effect(|id| Effect {
        id,
        kind: EffectKind::PowerUp(kind),
        position: at,
        velocity: Vec2::ZERO,
        half_extents: Vec2::splat(12.0),
        payload,
        created_at_ms: now,
        lifespan_ms: None,
        gravity: 0.0,
    })
}

/// Counts events matching a predicate.
pub fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|e| predicate(e)).count()
}
