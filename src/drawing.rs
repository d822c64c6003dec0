//! Winning numbers and jackpot-pool accounting
//!
//! The winning number for a block folds the revealed secrets of the last
//! `SECRET_WINDOW` blocks through iterated SHA3, so no single delegate
//! controls the outcome. Pool accounting is a running accumulator over the
//! whole block history: each draw takes its budget out of the carried pool
//! plus that block's ticket sales.

use crate::crypto::{sha3, sha3_concat};
use crate::rule::JackpotRule;
use crate::types::{BlockNum, Hash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DrawingError {
    #[error("draw budget {total_jackpot} exceeds the available pool {available}")]
    PoolExhausted { total_jackpot: u64, available: u64 },
    #[error("payouts {paid} exceed the draw's total jackpot {total_jackpot}")]
    BudgetExceeded { paid: u64, total_jackpot: u64 },
    #[error("pool accumulator overflow")]
    PoolOverflow,
}

/// Per-block lottery digest, written once at store time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Randomness derived from the reveal window ending at this block
    pub winning_number: u64,
    /// Ticket purchases committed in this block
    pub ticket_sales: u64,
    /// Settlement payouts committed in this block
    pub amount_won: u64,
}

/// Accounting for the jackpots resolvable at one block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DrawingRecord {
    /// Budget for this draw
    pub total_jackpot: u64,
    /// Cumulative payouts already claimed against this draw
    pub total_paid: u64,
    /// Unspent carry-over after this draw's budget was taken
    pub jackpot_pool: u64,
}

impl DrawingRecord {
    /// Build the record for a newly stored block. The pool must cover the
    /// budget the rule asks for; anything else is a consensus fault, not a
    /// recoverable condition.
    pub fn next(
        rule: &dyn JackpotRule,
        winning_number: u64,
        block_num: BlockNum,
        prev_pool: u64,
        ticket_sales: u64,
    ) -> Result<Self, DrawingError> {
        let available = prev_pool
            .checked_add(ticket_sales)
            .ok_or(DrawingError::PoolOverflow)?;
        let total_jackpot = rule.evaluate_total_jackpot(winning_number, block_num, available);
        let jackpot_pool = available
            .checked_sub(total_jackpot)
            .ok_or(DrawingError::PoolExhausted {
                total_jackpot,
                available,
            })?;
        Ok(Self {
            total_jackpot,
            total_paid: 0,
            jackpot_pool,
        })
    }

    /// Add a settlement's payouts to this draw. Fails if the cumulative
    /// payouts would exceed the budget.
    pub fn record_payout(&mut self, amount: u64) -> Result<(), DrawingError> {
        let paid = self
            .total_paid
            .checked_add(amount)
            .ok_or(DrawingError::PoolOverflow)?;
        if paid > self.total_jackpot {
            return Err(DrawingError::BudgetExceeded {
                paid,
                total_jackpot: self.total_jackpot,
            });
        }
        self.total_paid = paid;
        Ok(())
    }
}

/// Fold the reveal window into a 64-bit winning number.
///
/// `revealed` is the current block's revealed secret; `prior` holds the
/// revealed secrets of earlier blocks, newest first, already clamped to the
/// window (fewer near genesis).
pub fn winning_number(revealed: &Hash, prior: &[Hash]) -> u64 {
    let mut seed = sha3(revealed);
    for earlier in prior {
        seed = sha3_concat(earlier, &seed);
    }
    u64::from_le_bytes(seed[0..8].try_into().unwrap())
}
