//! Evaluation accumulators for transactions and blocks
//!
//! A [`TxEvaluationState`] lives for one transaction validation and is
//! discarded with the verdict. A [`BlockEvaluationState`] spans every
//! transaction of a candidate block and carries what `store` needs: ticket
//! sales, settlement payouts per draw, and delegate vote movement.

use crate::address::Address;
use crate::transaction::MetaInput;
use crate::types::{Asset, BlockNum, DelegateId, UnitId};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BalanceError {
    #[error("asset amount overflow")]
    Overflow,
    #[error("inputs of unit {0} do not cover outputs")]
    InsufficientFunds(UnitId),
}

fn add_to(map: &mut BTreeMap<UnitId, u64>, asset: Asset) -> Result<(), BalanceError> {
    let entry = map.entry(asset.unit).or_insert(0);
    *entry = entry
        .checked_add(asset.amount)
        .ok_or(BalanceError::Overflow)?;
    Ok(())
}

/// Per-transaction validation accumulator
#[derive(Debug, Default)]
pub struct TxEvaluationState {
    /// Resolved inputs, index-aligned with the transaction's inputs
    pub inputs: Vec<MetaInput>,
    /// Addresses with a valid signature over the transaction digest
    pub signed_by: HashSet<Address>,
    /// Ticket purchases committed by this transaction
    pub total_ticket_sales: u64,
    /// Jackpot amounts minted by winning ticket inputs
    pub ticket_winnings: u64,
    /// Whether a secret output was seen; a transaction may carry one at most
    pub found_secret_out: bool,
    input_balance: BTreeMap<UnitId, u64>,
    output_balance: BTreeMap<UnitId, u64>,
}

impl TxEvaluationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_signature(&self, owner: &Address) -> bool {
        self.signed_by.contains(owner)
    }

    pub fn add_input_asset(&mut self, asset: Asset) -> Result<(), BalanceError> {
        add_to(&mut self.input_balance, asset)
    }

    pub fn add_output_asset(&mut self, asset: Asset) -> Result<(), BalanceError> {
        add_to(&mut self.output_balance, asset)
    }

    pub fn add_ticket_sale(&mut self, amount: u64) -> Result<(), BalanceError> {
        self.total_ticket_sales = self
            .total_ticket_sales
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        Ok(())
    }

    pub fn add_ticket_winnings(&mut self, amount: u64) -> Result<(), BalanceError> {
        self.ticket_winnings = self
            .ticket_winnings
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        Ok(())
    }

    pub fn input_balance(&self, unit: UnitId) -> u64 {
        self.input_balance.get(&unit).copied().unwrap_or(0)
    }

    pub fn output_balance(&self, unit: UnitId) -> u64 {
        self.output_balance.get(&unit).copied().unwrap_or(0)
    }

    /// Inputs must cover outputs for every unit; the remainder is the fee
    /// and belongs to the base ledger.
    pub fn balance(&self) -> Result<(), BalanceError> {
        for (&unit, &out) in &self.output_balance {
            if self.input_balance(unit) < out {
                return Err(BalanceError::InsufficientFunds(unit));
            }
        }
        Ok(())
    }
}

/// Vote movement for one delegate within a block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelegateVotes {
    /// Votes leaving outputs that previously backed this delegate
    pub votes_in: u64,
    /// Votes arriving from transactions voting for this delegate
    pub votes_out: u64,
}

/// Per-block validation accumulator, handed back to `store`
#[derive(Debug, Default)]
pub struct BlockEvaluationState {
    /// Ticket purchases committed across the block
    pub ticket_sales: u64,
    /// Settlement payouts across the block
    pub amount_won: u64,
    /// In-block cumulative payouts per referenced draw
    pub draw_payouts: BTreeMap<BlockNum, u64>,
    /// Vote movement per delegate in the voting unit
    pub delegate_votes: BTreeMap<DelegateId, DelegateVotes>,
}

impl BlockEvaluationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ticket_sales(&mut self, amount: u64) -> Result<(), BalanceError> {
        self.ticket_sales = self
            .ticket_sales
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        Ok(())
    }

    pub fn add_amount_won(&mut self, amount: u64) -> Result<(), BalanceError> {
        self.amount_won = self
            .amount_won
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        Ok(())
    }

    /// Accumulate a settlement's payouts against a draw, returning the
    /// in-block cumulative total for that draw.
    pub fn add_draw_payout(&mut self, draw: BlockNum, amount: u64) -> Result<u64, BalanceError> {
        let entry = self.draw_payouts.entry(draw).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(BalanceError::Overflow)?;
        Ok(*entry)
    }

    pub fn add_input_delegate_votes(
        &mut self,
        delegate_id: DelegateId,
        amount: u64,
    ) -> Result<(), BalanceError> {
        let entry = self.delegate_votes.entry(delegate_id).or_default();
        entry.votes_in = entry
            .votes_in
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        Ok(())
    }

    pub fn add_output_delegate_votes(
        &mut self,
        delegate_id: DelegateId,
        amount: u64,
    ) -> Result<(), BalanceError> {
        let entry = self.delegate_votes.entry(delegate_id).or_default();
        entry.votes_out = entry
            .votes_out
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        Ok(())
    }
}
