//! Deferred task scheduler.
//!
//! Every delayed action of the simulation (effect reversal, recoil movement,
//! knockout removal, countdown steps, spawns, reset) is a [`Task`] value
//! queued with a due time. Tasks are plain data: they name the entity they
//! act on by [`EntityId`] and are executed by the
//! [`Simulation`](crate::simulation::Simulation), which re-checks that the
//! owner is still live before touching it.
//!
//! Each queued task also carries the scheduler epoch current at scheduling
//! time. [`Scheduler::advance_epoch`] bumps the epoch and drops every pending
//! task in one step; anything from an older epoch that still surfaces is
//! discarded on pop. A reset therefore never leaks a callback into the next
//! match.
//!
//! # Ordering
//!
//! Tasks fire in `(due_ms, insertion order)` order, so two tasks due at the
//! same instant run in the order they were scheduled.
//!
//! # Example
//!
//! ```
//! use gladiator_core::scheduler::{Scheduler, Task};
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.schedule(0, 1000, Task::CountdownStep);
//! scheduler.schedule(0, 500, Task::SpawnPowerUp);
//!
//! assert_eq!(scheduler.pop_due(400), None);
//! assert_eq!(scheduler.pop_due(1000), Some(Task::SpawnPowerUp));
//! assert_eq!(scheduler.pop_due(1000), Some(Task::CountdownStep));
//! ```

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, ModifierId};

/// A deferred action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Task {
    /// Revert a timed stat modifier.
    RevertModifier {
        /// Affected gladiator.
        agent: EntityId,
        /// Modifier to remove.
        modifier: ModifierId,
    },
    /// Give a confused gladiator a new random heading and re-arm until `until_ms`.
    ConfusionTick {
        /// Confused gladiator.
        agent: EntityId,
        /// End of the confusion.
        until_ms: u64,
    },
    /// Nudge a gladiator out of a face-to-face standoff after it attacked.
    BreakDeadlock {
        /// Attacking gladiator.
        agent: EntityId,
    },
    /// Remove a knocked-out gladiator from the arena.
    RemoveAgent {
        /// Knocked-out gladiator.
        agent: EntityId,
    },
    /// Remove an effect whose lifespan elapsed.
    ExpireEffect {
        /// Expiring effect.
        effect: EntityId,
    },
    /// Decrement the match countdown.
    CountdownStep,
    /// Spawn a power-up and schedule the next one.
    SpawnPowerUp,
    /// Spawn a hazard and schedule the next one.
    SpawnHazard,
    /// Step the post-match reset countdown.
    ResetStep,
}

impl Task {
    /// The entity this task acts on, if any.
    ///
    /// Tasks with an owner must be skipped when the owner is gone.
    #[must_use]
    pub fn owner(&self) -> Option<EntityId> {
        match *self {
            Self::RevertModifier { agent, .. }
            | Self::ConfusionTick { agent, .. }
            | Self::BreakDeadlock { agent }
            | Self::RemoveAgent { agent } => Some(agent),
            Self::ExpireEffect { effect } => Some(effect),
            Self::CountdownStep | Self::SpawnPowerUp | Self::SpawnHazard | Self::ResetStep => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    due_ms: u64,
    seq: u64,
    epoch: u64,
    task: Task,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Time-ordered queue of epoch-tagged [`Task`]s.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
    epoch: u64,
}

impl Scheduler {
    /// Creates an empty scheduler at epoch 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `task` to run `delay_ms` after `now_ms`.
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, task: Task) {
        let entry = Entry {
            due_ms: now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
            epoch: self.epoch,
            task,
        };
        self.next_seq += 1;
        self.queue.push(Reverse(entry));
    }

    /// Pops the earliest task due at or before `now_ms`.
    ///
    /// Tasks from a superseded epoch are dropped silently.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Task> {
        while let Some(Reverse(head)) = self.queue.peek() {
            if head.due_ms > now_ms {
                return None;
            }
            let Reverse(entry) = self.queue.pop()?;
            if entry.epoch == self.epoch {
                return Some(entry.task);
            }
            tracing::trace!(task = ?entry.task, epoch = entry.epoch, "dropping stale task");
        }
        None
    }

    /// Invalidates every pending task.
    pub fn advance_epoch(&mut self) {
        self.epoch += 1;
        let epoch = self.epoch;
        self.queue.retain(|Reverse(entry)| entry.epoch == epoch);
    }

    /// Current epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of tasks waiting in the current epoch.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue
            .iter()
            .filter(|Reverse(entry)| entry.epoch == self.epoch)
            .count()
    }
}
