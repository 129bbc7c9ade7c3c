//! Runs one match without a renderer and prints its result as JSON.
//!
//! Usage: `headless_match [SEED] [CONFIG.json]`
//!
//! Logging is controlled with `RUST_LOG`, e.g. `RUST_LOG=gladiator_core=debug`.

use std::fs;

use anyhow::{Context, Result};
use gladiator_core::config::ArenaConfig;
use gladiator_core::host::KinematicHost;
use gladiator_core::prediction::InMemoryLedger;
use gladiator_core::Simulation;

/// Host frame length.
const FRAME_MS: u64 = 16;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_config(path: Option<&String>) -> Result<ArenaConfig> {
    let Some(path) = path else {
        return Ok(ArenaConfig::default());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))
}

fn main() -> Result<()> {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = match args.first() {
        Some(raw) => raw.parse().with_context(|| format!("invalid seed {raw:?}"))?,
        None => 0,
    };
    let config = load_config(args.get(1))?;

    let mut host = KinematicHost::new(config.world.clone());
    let mut sim = Simulation::with_seed(config, Box::new(InMemoryLedger::new()), seed)?;
    sim.start(0);

    #[allow(clippy::cast_precision_loss)]
    let dt = FRAME_MS as f32 / 1000.0;
    let mut now = 0;
    while sim.last_result().is_none() {
        now += FRAME_MS;
        let commands = sim.tick(now);
        host.apply(&commands);
        host.step(&mut sim, dt);
        sim.take_events();
    }

    let result = sim.last_result().context("match produced no result")?;
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
