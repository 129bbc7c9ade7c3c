//! Error types.
//!
//! None of these are fatal to the simulation. Invalid entity references and
//! repeated termination requests are not errors at all; they are absorbed as
//! no-ops where they occur.

use thiserror::Error;

use crate::entity::EntityId;

/// Invalid [`ArenaConfig`](crate::config::ArenaConfig).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// World has a non-positive dimension.
    #[error("world must have positive size, got {width}x{height}")]
    EmptyWorld {
        /// Configured width.
        width: f32,
        /// Configured height.
        height: f32,
    },
    /// Corner spawn zones would overlap each other.
    #[error("spawn zones do not fit in the world corners")]
    SpawnZonesOverlap,
    /// A range has `min > max` or a non-finite bound.
    #[error("invalid range for {field}: [{min}, {max}]")]
    InvalidRange {
        /// Name of the offending field.
        field: &'static str,
        /// Configured lower bound.
        min: f64,
        /// Configured upper bound.
        max: f64,
    },
    /// A probability-like stat range leaves `[0, 1]`.
    #[error("{0} must stay within [0, 1]")]
    OutOfUnitInterval(&'static str),
    /// A duration that must be positive is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    /// Evasion needs between one and eight probe points.
    #[error("evade_candidates must be 1..=8, got {0}")]
    EvadeCandidates(u8),
    /// A match needs at least two gladiators.
    #[error("a match needs at least 2 gladiators, got {0}")]
    TooFewGladiators(usize),
}

/// Failure reported by a [`Ledger`](crate::prediction::Ledger).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The account cannot cover the requested amount.
    #[error("insufficient balance for {account}: has {balance}, needs {requested}")]
    InsufficientBalance {
        /// Account that was charged.
        account: String,
        /// Balance at the time of the request.
        balance: u64,
        /// Requested amount.
        requested: u64,
    },
    /// Zero amounts are rejected.
    #[error("amount must be greater than zero")]
    InvalidAmount,
}

/// Failure to place a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    /// Predictions are only accepted while a match is running.
    #[error("no match is running")]
    MatchNotRunning,
    /// The gladiator is not a live participant of the current match.
    #[error("gladiator {0} is not in the current match")]
    UnknownGladiator(EntityId),
    /// One prediction per voter per match.
    #[error("{0} already placed a prediction this match")]
    AlreadyPredicted(String),
    /// The stake could not be charged.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Failure to cast an MVP vote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    /// No ballot is open.
    #[error("MVP voting is not active")]
    NotActive,
    /// The gladiator did not take part in the match.
    #[error("gladiator {0} is not eligible for MVP")]
    Ineligible(EntityId),
    /// One vote per voter per ballot.
    #[error("{0} already voted in this ballot")]
    AlreadyVoted(String),
    /// The vote cost could not be charged.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
