//! Core type aliases and chain-wide constants

use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA3-256 digest
pub type Hash = [u8; 32];

/// ML-DSA-65 public key bytes
pub type PublicKey = Vec<u8>;

/// ML-DSA-65 detached signature bytes
pub type Signature = Vec<u8>;

/// Block height. Record keys are this width on disk.
pub type BlockNum = u32;

/// Delegate identifier, assigned at registration
pub type DelegateId = u32;

/// Asset unit identifier
pub type UnitId = u8;

/// All-zero digest; the canonical empty value a delegate reveals in its
/// first produced block.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Smallest sub-unit per whole coin
pub const COIN: u64 = 100_000;

/// Blocks between a ticket purchase and the drawing that resolves it
pub const DRAW_DELAY: BlockNum = 100;

/// Revealed secrets folded into each block's winning number
pub const SECRET_WINDOW: u32 = 100;

/// Blocks per day at the 60-second production interval
pub const BLOCKS_PER_DAY: BlockNum = 1440;

/// Hard cap on the amount of any single jackpot output
pub const MAX_JACKPOT_OUTPUT: u64 = 2_000_000 * COIN;

/// The asset unit that carries delegate votes
pub const VOTE_UNIT: UnitId = 0;

/// An amount of some asset unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub amount: u64,
    pub unit: UnitId,
}

impl Asset {
    pub fn new(amount: u64, unit: UnitId) -> Self {
        Self { amount, unit }
    }

    /// Amount denominated in the voting unit
    pub fn votes(amount: u64) -> Self {
        Self {
            amount,
            unit: VOTE_UNIT,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:05} (unit {})",
            self.amount / COIN,
            self.amount % COIN,
            self.unit
        )
    }
}
