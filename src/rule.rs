//! Jackpot payout rules

use crate::types::BlockNum;

/// Closest-match threshold for the default rule, in bits
pub const MATCH_BITS: u32 = 16;

/// Strategy deciding how much each draw budgets and pays out.
///
/// Implementations must be deterministic and side-effect free; every node
/// must compute identical values from identical inputs, or the chain forks.
pub trait JackpotRule: Send + Sync {
    /// Budget for the draw resolved at `block_num`, taken out of
    /// `available_pool` (previous pool plus this block's ticket sales).
    fn evaluate_total_jackpot(
        &self,
        winning_number: u64,
        block_num: BlockNum,
        available_pool: u64,
    ) -> u64;

    /// Payout for one ticket against a draw's budget. Zero means the ticket
    /// lost, which is the common case.
    fn evaluate_jackpot(&self, winning_number: u64, lucky_number: u64, total_jackpot: u64) -> u64;
}

/// Default rule: each draw budgets a fixed share of the available pool, and
/// a ticket is paid by how closely its lucky number matches the winning
/// number in Hamming distance. Halving the payout per differing bit keeps
/// the expected payout far below the budget.
#[derive(Debug, Clone, Copy)]
pub struct PoolShareRule {
    /// Denominator of the per-draw pool share
    pub share_divisor: u64,
}

impl Default for PoolShareRule {
    fn default() -> Self {
        Self { share_divisor: 10 }
    }
}

impl JackpotRule for PoolShareRule {
    fn evaluate_total_jackpot(
        &self,
        _winning_number: u64,
        _block_num: BlockNum,
        available_pool: u64,
    ) -> u64 {
        available_pool / self.share_divisor.max(1)
    }

    fn evaluate_jackpot(&self, winning_number: u64, lucky_number: u64, total_jackpot: u64) -> u64 {
        let distance = (winning_number ^ lucky_number).count_ones();
        if distance > MATCH_BITS {
            return 0;
        }
        total_jackpot >> distance
    }
}
