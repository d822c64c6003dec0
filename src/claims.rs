//! Output claim conditions
//!
//! Tags 30..=32 are the range reserved for the lottery inside the claim-type
//! space shared with the base ledger; tag 1 is the ledger's plain signature
//! claim. A separate operation tag space overlaps this range, see
//! [`crate::operations`].

use crate::address::Address;
use crate::types::{DelegateId, Hash};
use serde::{Deserialize, Serialize};

pub const CLAIM_SIGNATURE: u8 = 1;
pub const CLAIM_SECRET: u8 = 30;
pub const CLAIM_TICKET: u8 = 31;
pub const CLAIM_JACKPOT: u8 = 32;

/// Spend condition attached to a transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Claim {
    /// Spendable with a signature from `owner`
    Signature { owner: Address },
    /// Delegate randomness commitment, one per block
    Secret(ClaimSecretOutput),
    /// A locked ticket purchase
    Ticket(ClaimTicketOutput),
    /// A pending jackpot payout
    Jackpot(ClaimJackpotOutput),
}

impl Claim {
    /// Tag in the shared claim-type space
    pub fn tag(&self) -> u8 {
        match self {
            Claim::Signature { .. } => CLAIM_SIGNATURE,
            Claim::Secret(_) => CLAIM_SECRET,
            Claim::Ticket(_) => CLAIM_TICKET,
            Claim::Jackpot(_) => CLAIM_JACKPOT,
        }
    }
}

/// Commit-reveal data carried in a block's secret output. Duplicates the
/// header fields so the claim survives on its own in the output store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSecretOutput {
    /// hash(S[n]): commitment to the secret this delegate reveals next
    pub secret: Hash,
    /// S[n-1]: opens the commitment from the delegate's previous block
    pub revealed_secret: Hash,
    /// Delegate whose chain this extends
    pub delegate_id: DelegateId,
}

/// A locked ticket purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTicketOutput {
    /// The number chosen by the player, or at random
    pub lucky_number: u64,
    /// Who owns the ticket and thus can claim the jackpot
    pub owner: Address,
    /// Multiplier trading probability of winning against payout size
    pub odds: u16,
}

/// A jackpot payout, spendable by `owner` after `mature_day` whole days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimJackpotOutput {
    /// Beneficiary of the payout
    pub owner: Address,
    /// Whole days past the source block before the output may be spent
    pub mature_day: u16,
}
