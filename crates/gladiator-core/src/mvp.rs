//! Post-match MVP ballot.
//!
//! When a match ends, its participants become eligible for an MVP vote.
//! Each voter may vote once, paying a fixed token cost through the
//! [`Ledger`]. The ballot closes after a fixed window, or sooner once
//! someone votes: a manual vote shortens the remaining window. The
//! gladiator with the most votes wins; ties go to the one listed first,
//! and if nobody voted the MVP is drawn at random.
//!
//! Ballots run on their own clock and survive the reset into the next
//! match.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::VoteError;
use crate::prediction::Ledger;

/// An open MVP ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvpBallot {
    match_id: u64,
    eligible: Vec<EntityId>,
    votes: Vec<(String, EntityId)>,
    closes_at_ms: u64,
}

/// Outcome of a closed ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvpResult {
    /// Match the ballot belonged to.
    pub match_id: u64,
    /// Elected gladiator, `None` only if nobody was eligible.
    pub mvp: Option<EntityId>,
    /// Votes cast.
    pub total_votes: u32,
    /// Votes per eligible gladiator, in eligibility order.
    pub votes_by_gladiator: Vec<(EntityId, u32)>,
    /// True if nobody voted and the MVP was drawn at random.
    pub random: bool,
}

impl MvpBallot {
    /// Opens a ballot closing `window_ms` from now.
    #[must_use]
    pub fn open(match_id: u64, eligible: Vec<EntityId>, now_ms: u64, window_ms: u64) -> Self {
        Self {
            match_id,
            eligible,
            votes: Vec::new(),
            closes_at_ms: now_ms.saturating_add(window_ms),
        }
    }

    /// Match the ballot belongs to.
    #[must_use]
    pub fn match_id(&self) -> u64 {
        self.match_id
    }

    /// Gladiators that can be voted for.
    #[must_use]
    pub fn eligible(&self) -> &[EntityId] {
        &self.eligible
    }

    /// Closing time.
    #[must_use]
    pub fn closes_at_ms(&self) -> u64 {
        self.closes_at_ms
    }

    /// Charges the vote cost and records a vote, then shortens the window
    /// to at most `post_vote_window_ms` from now.
    ///
    /// # Errors
    ///
    /// [`VoteError::Ineligible`] for a gladiator outside the match,
    /// [`VoteError::AlreadyVoted`] on a second vote, or the ledger failure.
    pub fn cast(
        &mut self,
        ledger: &mut dyn Ledger,
        voter: &str,
        gladiator: EntityId,
        cost: u64,
        now_ms: u64,
        post_vote_window_ms: u64,
    ) -> Result<(), VoteError> {
        if !self.eligible.contains(&gladiator) {
            return Err(VoteError::Ineligible(gladiator));
        }
        if self.votes.iter().any(|(v, _)| v == voter) {
            return Err(VoteError::AlreadyVoted(voter.to_string()));
        }
        ledger.spend(voter, cost)?;
        self.votes.push((voter.to_string(), gladiator));
        self.closes_at_ms = self
            .closes_at_ms
            .min(now_ms.saturating_add(post_vote_window_ms));
        Ok(())
    }

    /// Returns true once the window has elapsed.
    #[must_use]
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.closes_at_ms
    }

    /// Tallies the votes.
    #[allow(clippy::cast_possible_truncation)]
    pub fn close<R: Rng + ?Sized>(self, rng: &mut R) -> MvpResult {
        let votes_by_gladiator: Vec<(EntityId, u32)> = self
            .eligible
            .iter()
            .map(|id| {
                let count = self.votes.iter().filter(|(_, g)| g == id).count();
                (*id, count as u32)
            })
            .collect();

        let mut leader: Option<(EntityId, u32)> = None;
        for &(id, count) in &votes_by_gladiator {
            if count > 0 && leader.map_or(true, |(_, best)| count > best) {
                leader = Some((id, count));
            }
        }

        let (mvp, random) = match leader {
            Some((id, _)) => (Some(id), false),
            None if self.eligible.is_empty() => (None, false),
            None => (Some(self.eligible[rng.gen_range(0..self.eligible.len())]), true),
        };

        MvpResult {
            match_id: self.match_id,
            mvp,
            total_votes: self.votes.len() as u32,
            votes_by_gladiator,
            random,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::prediction::InMemoryLedger;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ids() -> Vec<EntityId> {
        (0..4).map(EntityId::new).collect()
    }

    fn ledger() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new();
        for voter in ["a", "b", "c"] {
            ledger.mint(voter, 1);
        }
        ledger
    }

    #[test]
    fn most_votes_wins_and_ties_go_first() {
        let mut ledger = ledger();
        let mut ballot = MvpBallot::open(1, ids(), 0, 15_000);
        ballot.cast(&mut ledger, "a", EntityId::new(2), 1, 0, 5000).unwrap();
        ballot.cast(&mut ledger, "b", EntityId::new(1), 1, 0, 5000).unwrap();

        let result = ballot.close(&mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(result.mvp, Some(EntityId::new(1)));
        assert_eq!(result.total_votes, 2);
        assert!(!result.random);
        assert_eq!(result.votes_by_gladiator[2], (EntityId::new(2), 1));
    }

    #[test]
    fn vote_rules_are_enforced() {
        let mut ledger = ledger();
        let mut ballot = MvpBallot::open(1, ids(), 0, 15_000);
        assert_eq!(
            ballot.cast(&mut ledger, "a", EntityId::new(9), 1, 0, 5000),
            Err(VoteError::Ineligible(EntityId::new(9)))
        );
        ballot.cast(&mut ledger, "a", EntityId::new(0), 1, 0, 5000).unwrap();
        assert_eq!(
            ballot.cast(&mut ledger, "a", EntityId::new(1), 1, 0, 5000),
            Err(VoteError::AlreadyVoted("a".to_string()))
        );
        assert!(matches!(
            ballot.cast(&mut ledger, "broke", EntityId::new(1), 1, 0, 5000),
            Err(VoteError::Ledger(LedgerError::InsufficientBalance { .. }))
        ));
        assert_eq!(ledger.balance("a"), 0);
    }

    #[test]
    fn manual_vote_shortens_window() {
        let mut ledger = ledger();
        let mut ballot = MvpBallot::open(1, ids(), 0, 15_000);
        assert!(!ballot.is_due(14_999));
        ballot.cast(&mut ledger, "a", EntityId::new(0), 1, 2000, 5000).unwrap();
        assert_eq!(ballot.closes_at_ms(), 7000);
        assert!(ballot.is_due(7000));

        // A late vote never extends the window
        ballot.cast(&mut ledger, "b", EntityId::new(0), 1, 6000, 5000).unwrap();
        assert_eq!(ballot.closes_at_ms(), 7000);
    }

    #[test]
    fn no_votes_draws_random_eligible() {
        let ballot = MvpBallot::open(3, ids(), 0, 15_000);
        let result = ballot.close(&mut ChaCha8Rng::seed_from_u64(4));
        assert!(result.random);
        assert!(ids().contains(&result.mvp.unwrap()));
        assert_eq!(result.total_votes, 0);
    }

    #[test]
    fn empty_ballot_has_no_mvp() {
        let ballot = MvpBallot::open(3, Vec::new(), 0, 15_000);
        let result = ballot.close(&mut ChaCha8Rng::seed_from_u64(4));
        assert_eq!(result.mvp, None);
    }
}
