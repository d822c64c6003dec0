//! Operation-tagged records
//!
//! A parallel encoding of ticket purchases and jackpot payouts kept for the
//! operation tag space. Validation dispatches on output claims only
//! ([`crate::claims`]); nothing here is evaluated. The two tag spaces overlap
//! numerically (30..=31 here, 30..=32 for claims) and must not be mixed.

use crate::address::Address;
use crate::claims::ClaimTicketOutput;
use serde::{Deserialize, Serialize};

pub const TICKET_OP: u8 = 30;
pub const JACKPOT_OP: u8 = 31;

/// Record in the operation tag space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Ticket(TicketOperation),
    Jackpot(JackpotOperation),
}

impl Operation {
    /// Tag in the operation tag space, distinct from claim tags
    pub fn tag(&self) -> u8 {
        match self {
            Operation::Ticket(_) => TICKET_OP,
            Operation::Jackpot(_) => JACKPOT_OP,
        }
    }
}

/// Ticket purchase as an operation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketOperation {
    /// Who owns the ticket and thus can receive the jackpot
    pub owner: Address,
    pub ticket: ClaimTicketOutput,
}

/// Jackpot payout as an operation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JackpotOperation {
    /// Beneficiary of the payout
    pub owner: Address,
    /// Whole days before the payout may be spent
    pub mature_day: u16,
}
