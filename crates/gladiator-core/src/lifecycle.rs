//! Match lifecycle.
//!
//! A match moves through `Spawning → Running → Ending → Resetting` and is
//! then replaced by a new match with the next id. Termination is checked at
//! most once per tick and the transition into `Ending` is guarded by a
//! single flag, so however many triggers fire in one tick the match ends
//! exactly once.
//!
//! # Winner Rules
//!
//! - Elimination: the single remaining gladiator wins; if nobody remains
//!   (simultaneous knockouts) the match is a draw.
//! - Timeout: the remaining gladiator with the most health wins; a tie for
//!   the most health is a draw.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::prediction::PredictionRecord;

/// Phase of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchState {
    /// Gladiators are being placed.
    Spawning,
    /// Fighting.
    Running,
    /// Frozen; result emitted, waiting for the reset countdown.
    Ending,
    /// Tearing down before the next match.
    Resetting,
}

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// At most one gladiator left standing.
    Elimination,
    /// The countdown reached zero.
    Timeout,
}

/// Aggregate counters of one match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    /// Power-ups picked up.
    pub power_ups_collected: u32,
    /// Hazard contacts.
    pub hazards_triggered: u32,
    /// Strikes resolved.
    pub attacks: u32,
    /// Knockouts.
    pub knockouts: u32,
}

/// The live match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    id: u64,
    state: MatchState,
    time_remaining_s: u32,
    started_at_ms: u64,
    ended_at_ms: Option<u64>,
    reset_remaining_s: u32,
    stats: MatchStats,
    participants: Vec<EntityId>,
    ending: bool,
}

impl Match {
    /// Creates a match in the `Spawning` state.
    #[must_use]
    pub fn new(id: u64, duration_s: u32, now_ms: u64) -> Self {
        Self {
            id,
            state: MatchState::Spawning,
            time_remaining_s: duration_s,
            started_at_ms: now_ms,
            ended_at_ms: None,
            reset_remaining_s: 0,
            stats: MatchStats::default(),
            participants: Vec::new(),
            ending: false,
        }
    }

    /// Match id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current phase.
    #[must_use]
    pub fn state(&self) -> MatchState {
        self.state
    }

    /// Returns true while fighting.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == MatchState::Running
    }

    /// Seconds left on the match countdown.
    #[must_use]
    pub fn time_remaining_s(&self) -> u32 {
        self.time_remaining_s
    }

    /// Seconds left until the next match, once ended.
    #[must_use]
    pub fn reset_remaining_s(&self) -> u32 {
        self.reset_remaining_s
    }

    /// Aggregate counters.
    #[must_use]
    pub fn stats(&self) -> MatchStats {
        self.stats
    }

    /// Counters, mutably.
    pub fn stats_mut(&mut self) -> &mut MatchStats {
        &mut self.stats
    }

    /// Gladiators that started the match.
    #[must_use]
    pub fn participants(&self) -> &[EntityId] {
        &self.participants
    }

    /// Records the participants and starts fighting.
    pub fn begin_running(&mut self, participants: Vec<EntityId>) {
        if self.state != MatchState::Spawning {
            return;
        }
        self.participants = participants;
        self.state = MatchState::Running;
    }

    /// Decrements the countdown by one step. Returns the seconds left.
    pub fn countdown_step(&mut self) -> u32 {
        if self.is_running() {
            self.time_remaining_s = self.time_remaining_s.saturating_sub(1);
        }
        self.time_remaining_s
    }

    /// Returns why the match should end now, if it should.
    ///
    /// Always `None` unless running and not already ending.
    #[must_use]
    pub fn check_termination(&self, live_count: usize) -> Option<EndReason> {
        if !self.is_running() || self.ending {
            return None;
        }
        if live_count <= 1 {
            Some(EndReason::Elimination)
        } else if self.time_remaining_s == 0 {
            Some(EndReason::Timeout)
        } else {
            None
        }
    }

    /// Enters `Ending`. Returns false if the match already ended.
    pub fn begin_ending(&mut self, now_ms: u64, reset_delay_s: u32) -> bool {
        if self.ending {
            return false;
        }
        self.ending = true;
        self.state = MatchState::Ending;
        self.ended_at_ms = Some(now_ms);
        self.reset_remaining_s = reset_delay_s;
        true
    }

    /// Decrements the reset countdown. Returns the seconds left.
    pub fn reset_step(&mut self) -> u32 {
        self.reset_remaining_s = self.reset_remaining_s.saturating_sub(1);
        self.reset_remaining_s
    }

    /// Enters `Resetting`.
    pub fn begin_resetting(&mut self) {
        if self.state == MatchState::Ending {
            self.state = MatchState::Resetting;
        }
    }

    /// Elapsed match time in seconds, up to the end if it ended.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_s(&self, now_ms: u64) -> f32 {
        let end = self.ended_at_ms.unwrap_or(now_ms);
        end.saturating_sub(self.started_at_ms) as f32 / 1000.0
    }
}

/// Picks the winner among the gladiators left standing, given as
/// `(id, health)` in id order.
#[must_use]
pub fn determine_winner(reason: EndReason, standing: &[(EntityId, f32)]) -> Option<EntityId> {
    match reason {
        EndReason::Elimination => match standing {
            [(id, _)] => Some(*id),
            _ => None,
        },
        EndReason::Timeout => {
            let best = standing
                .iter()
                .map(|(_, health)| *health)
                .fold(f32::NEG_INFINITY, f32::max);
            let mut leaders = standing.iter().filter(|(_, health)| *health == best);
            match (leaders.next(), leaders.next()) {
                (Some((id, _)), None) => Some(*id),
                _ => None,
            }
        }
    }
}

/// Finalized record of a match for external storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Match id.
    pub match_id: u64,
    /// Winner, `None` on a draw.
    pub winner: Option<EntityId>,
    /// Why the match ended.
    pub reason: EndReason,
    /// Elapsed match time in seconds.
    pub duration_s: f32,
    /// Aggregate counters.
    pub stats: MatchStats,
    /// Gladiators that took part.
    pub participants: Vec<EntityId>,
    /// Predictions placed during the match, flagged correct or not.
    pub predictions: Vec<PredictionRecord>,
}

/// Read-only match state for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Match id.
    pub match_id: u64,
    /// Current phase.
    pub state: MatchState,
    /// Seconds left on the match countdown.
    pub time_remaining_s: u32,
    /// Gladiators still fighting.
    pub live_count: usize,
    /// Aggregate counters.
    pub stats: MatchStats,
}
