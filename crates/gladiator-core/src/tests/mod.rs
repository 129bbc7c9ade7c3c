//! Crate-level tests driving the full simulation.
//!
//! # Test Structure
//!
//! - `determinism.rs`: same seed, same match
//! - `integration.rs`: contacts, effects, predictions and the MVP ballot
//!   through the public simulation API
//! - `lifecycle.rs`: termination, winner rules and the reset cycle
//! - `helpers.rs`: setup utilities

mod helpers;
mod integration;
