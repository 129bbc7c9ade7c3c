//! Outputs of the simulation toward its host.
//!
//! The core talks to the outside world through two channels:
//! - [`Command`]: per-tick instructions for the physics host (desired
//!   velocities)
//! - [`Event`]: discrete notifications for presentation and bookkeeping
//!   layers, buffered in an [`EventLog`] and drained by the host
//!
//! Both are plain serde data.
//!
//! # Example
//!
//! ```
//! use gladiator_core::output::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.push(Event::CountdownTick { remaining_s: 59 });
//! assert_eq!(log.len(), 1);
//!
//! let drained = log.take();
//! assert_eq!(drained, vec![Event::CountdownTick { remaining_s: 59 }]);
//! assert!(log.is_empty());
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::effects::{ChaosRoll, HazardKind, PowerUpKind};
use crate::entity::EntityId;
use crate::lifecycle::{EndReason, MatchStats};

// =============================================================================
// Commands
// =============================================================================

/// Instruction for the physics host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Set the velocity of a gladiator, in units per second.
    SetVelocity {
        /// Gladiator to move.
        target: EntityId,
        /// Desired velocity.
        velocity: Vec2,
    },
}

// =============================================================================
// Events
// =============================================================================

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A new match is running.
    MatchStarted {
        /// Match id.
        match_id: u64,
        /// Participants in id order.
        gladiators: Vec<EntityId>,
    },
    /// A viewer selected a gladiator to follow.
    GladiatorSelected {
        /// Selected gladiator.
        gladiator: EntityId,
    },
    /// A viewer staked tokens on a gladiator.
    PredictionMade {
        /// Predicted winner.
        gladiator: EntityId,
        /// Stake.
        amount: u64,
        /// Viewer account.
        voter: String,
    },
    /// A strike was resolved.
    AttackResolved {
        /// Attacker.
        attacker: EntityId,
        /// Defender.
        defender: EntityId,
        /// Defender evaded.
        dodged: bool,
        /// Critical hit.
        critical: bool,
        /// Damage dealt.
        damage: f32,
    },
    /// A gladiator's health reached zero.
    KnockedOut {
        /// Knocked-out gladiator.
        gladiator: EntityId,
    },
    /// A power-up appeared.
    PowerUpSpawned {
        /// Effect id.
        effect: EntityId,
        /// Kind.
        kind: PowerUpKind,
        /// Position.
        position: Vec2,
    },
    /// A gladiator picked up a power-up.
    PowerUpCollected {
        /// Collector.
        gladiator: EntityId,
        /// Consumed effect.
        effect: EntityId,
        /// Kind.
        kind: PowerUpKind,
        /// Chaos outcome, for chaos pickups.
        chaos: Option<ChaosRoll>,
    },
    /// An uncollected power-up disappeared.
    PowerUpExpired {
        /// Effect id.
        effect: EntityId,
    },
    /// A hazard appeared.
    HazardSpawned {
        /// Effect id.
        effect: EntityId,
        /// Kind.
        kind: HazardKind,
        /// Position.
        position: Vec2,
    },
    /// A hazard hit a gladiator.
    HazardTriggered {
        /// Victim.
        gladiator: EntityId,
        /// Hazard id.
        effect: EntityId,
        /// Kind.
        kind: HazardKind,
        /// Damage dealt.
        damage: f32,
    },
    /// A hazard expired or left the world.
    HazardRemoved {
        /// Effect id.
        effect: EntityId,
    },
    /// The match countdown advanced.
    CountdownTick {
        /// Seconds left.
        remaining_s: u32,
    },
    /// The match is over.
    MatchEnd {
        /// Match id.
        match_id: u64,
        /// Winner, `None` on a draw.
        winner: Option<EntityId>,
        /// Why the match ended.
        reason: EndReason,
        /// Aggregate counters.
        stats: MatchStats,
        /// Elapsed match time in seconds.
        duration_s: f32,
    },
    /// The post-match countdown advanced.
    ResetCountdown {
        /// Seconds until the next match.
        remaining_s: u32,
    },
    /// The MVP ballot closed.
    MvpDecided {
        /// Match the ballot belonged to.
        match_id: u64,
        /// Elected gladiator.
        gladiator: EntityId,
        /// Votes received.
        votes: u32,
        /// True if nobody voted and the MVP was drawn at random.
        random: bool,
    },
}

/// Buffer of events not yet drained by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Drains all buffered events in emission order.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
