//! Viewer predictions and the token ledger seam.
//!
//! The simulation never owns token balances. It is handed a [`Ledger`] at
//! construction and charges stakes and vote costs through it; a failed
//! charge surfaces as a structured error to the caller and never disturbs
//! the match. Rewards are paid by the host after the match from the
//! [`MatchResult`](crate::lifecycle::MatchResult) using
//! [`distribute_rewards`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{LedgerError, PredictionError};

// =============================================================================
// Ledger
// =============================================================================

/// Token balance service.
pub trait Ledger {
    /// Current balance of `account`; unknown accounts hold zero.
    fn balance(&self, account: &str) -> u64;

    /// Charges `amount` to `account`. Returns the new balance.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InsufficientBalance`] if the account cannot cover the
    /// amount, [`LedgerError::InvalidAmount`] for zero.
    fn spend(&mut self, account: &str, amount: u64) -> Result<u64, LedgerError>;

    /// Credits `amount` to `account`. Returns the new balance.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] for zero.
    fn credit(&mut self, account: &str, amount: u64) -> Result<u64, LedgerError>;
}

/// Ledger kept in memory, for development hosts and tests.
///
/// # Example
///
/// ```
/// use gladiator_core::prediction::{InMemoryLedger, Ledger};
///
/// let mut ledger = InMemoryLedger::new();
/// ledger.mint("0xabc", 10);
/// assert_eq!(ledger.spend("0xabc", 4), Ok(6));
/// assert!(ledger.spend("0xabc", 7).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryLedger {
    balances: BTreeMap<String, u64>,
}

impl InMemoryLedger {
    /// Creates a ledger with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds tokens out of thin air.
    pub fn mint(&mut self, account: &str, amount: u64) {
        *self.balances.entry(account.to_string()).or_default() += amount;
    }
}

impl Ledger for InMemoryLedger {
    fn balance(&self, account: &str) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn spend(&mut self, account: &str, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let balance = self.balance(account);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account: account.to_string(),
                balance,
                requested: amount,
            });
        }
        let remaining = balance - amount;
        self.balances.insert(account.to_string(), remaining);
        Ok(remaining)
    }

    fn credit(&mut self, account: &str, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let balance = self.balances.entry(account.to_string()).or_default();
        *balance = balance.saturating_add(amount);
        Ok(*balance)
    }
}

// =============================================================================
// Predictions
// =============================================================================

/// A stake on a gladiator winning the current match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Viewer account.
    pub voter: String,
    /// Predicted winner.
    pub gladiator: EntityId,
    /// Stake.
    pub amount: u64,
}

/// A settled prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Viewer account.
    pub voter: String,
    /// Predicted winner.
    pub gladiator: EntityId,
    /// Stake.
    pub amount: u64,
    /// True if the predicted gladiator won.
    pub correct: bool,
}

/// Predictions placed during the current match, one per voter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionBook {
    open: Vec<Prediction>,
}

impl PredictionBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Charges the stake and records the prediction.
    ///
    /// # Errors
    ///
    /// [`PredictionError::AlreadyPredicted`] on a second prediction by the
    /// same voter, or the ledger failure if the stake cannot be charged.
    pub fn place(
        &mut self,
        ledger: &mut dyn Ledger,
        voter: &str,
        gladiator: EntityId,
        amount: u64,
    ) -> Result<(), PredictionError> {
        if self.open.iter().any(|p| p.voter == voter) {
            return Err(PredictionError::AlreadyPredicted(voter.to_string()));
        }
        ledger.spend(voter, amount)?;
        self.open.push(Prediction {
            voter: voter.to_string(),
            gladiator,
            amount,
        });
        Ok(())
    }

    /// Open predictions in placement order.
    #[must_use]
    pub fn predictions(&self) -> &[Prediction] {
        &self.open
    }

    /// Flags every open prediction against the winner and empties the book.
    pub fn settle(&mut self, winner: Option<EntityId>) -> Vec<PredictionRecord> {
        self.open
            .drain(..)
            .map(|p| PredictionRecord {
                correct: Some(p.gladiator) == winner,
                voter: p.voter,
                gladiator: p.gladiator,
                amount: p.amount,
            })
            .collect()
    }

    /// Drops open predictions without settling them.
    pub fn clear(&mut self) {
        self.open.clear();
    }
}

/// Pays `amount * multiplier` to every correct prediction.
///
/// Returns the total paid out.
///
/// # Errors
///
/// Stops at the first ledger failure.
pub fn distribute_rewards(
    ledger: &mut dyn Ledger,
    records: &[PredictionRecord],
    multiplier: u64,
) -> Result<u64, LedgerError> {
    let mut total = 0_u64;
    for record in records.iter().filter(|r| r.correct) {
        let reward = record.amount.saturating_mul(multiplier);
        ledger.credit(&record.voter, reward)?;
        total = total.saturating_add(reward);
        tracing::debug!(voter = %record.voter, reward, "prediction reward paid");
    }
    Ok(total)
}
