//! # Gladiator Core
//!
//! Autonomous gladiator arena simulation.
//!
//! This crate runs continuous free-for-all matches between AI-driven
//! gladiators. Each gladiator has randomized stats and a finite-state
//! decision loop; power-ups and hazards spawn on timers; matches end by
//! elimination or timeout and then reset into the next one. Viewers can
//! stake tokens on a winner and vote for an MVP through an injected
//! [`Ledger`](prediction::Ledger).
//!
//! ## Architecture
//!
//! - **Arena**: id-keyed registry of gladiators and effects
//! - **Entities**: gladiators with stats, modifier stacks and a behavior
//!   state machine
//! - **Effects**: power-ups and hazards
//! - **Resolvers**: targeting and combat
//! - **Scheduler**: deferred tasks with liveness re-checks
//! - **Simulation**: the tick loop tying everything together
//!
//! Motion and collision belong to a host engine; the core emits desired
//! velocities and consumes [`Contact`](host::Contact)s.
//!
//! ## Usage
//!
//! ```
//! use gladiator_core::config::ArenaConfig;
//! use gladiator_core::host::KinematicHost;
//! use gladiator_core::prediction::InMemoryLedger;
//! use gladiator_core::simulation::Simulation;
//!
//! let config = ArenaConfig::default();
//! let mut host = KinematicHost::new(config.world.clone());
//! let mut sim = Simulation::with_seed(config, Box::new(InMemoryLedger::new()), 42)?;
//!
//! sim.start(0);
//! for frame in 1..=60_u64 {
//!     let commands = sim.tick(frame * 16);
//!     host.apply(&commands);
//!     host.step(&mut sim, 0.016);
//! }
//! assert!(!sim.take_events().is_empty());
//! # Ok::<(), gladiator_core::error::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod config;
pub mod effects;
pub mod entity;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod mvp;
pub mod output;
pub mod prediction;
pub mod resolver;
pub mod scheduler;
pub mod simulation;

pub use arena::Arena;
pub use config::ArenaConfig;
pub use entity::EntityId;
pub use simulation::Simulation;

#[cfg(test)]
mod tests;
