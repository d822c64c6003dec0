//! Per-claim transaction validation
//!
//! Dispatches on the claim carried by each input and output. Ticket inputs
//! classify the whole transaction as a deterministic settlement with a fixed
//! shape; everything else follows the per-claim rules and the generic
//! balance check.

use crate::address::Address;
use crate::claims::{Claim, ClaimJackpotOutput, ClaimTicketOutput};
use crate::crypto;
use crate::ledger::{BaseLedger, LedgerError};
use crate::rule::JackpotRule;
use crate::state::{BalanceError, BlockEvaluationState, TxEvaluationState};
use crate::store::{Storage, StoreError};
use crate::transaction::{MetaInput, OutputIndex, SignedTransaction, TxOutput};
use crate::types::{Asset, BLOCKS_PER_DAY, BlockNum, DRAW_DELAY, MAX_JACKPOT_OUTPUT, VOTE_UNIT};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("transaction encoding: {0}")]
    Encoding(#[from] bincode::Error),
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid signature")]
    BadSignature,
    #[error("missing signature for owner {0}")]
    MissingSignature(Address),
    #[error("secret output must carry a zero amount")]
    NonZeroSecretAmount,
    #[error("transaction carries a second secret output")]
    DuplicateSecretOutput,
    #[error("ticket-spending transaction outside the settlement set")]
    UnexpectedSettlement,
    #[error("deterministic transaction has no ticket input")]
    NotASettlement,
    #[error("settlement input {0} is not a ticket")]
    NonTicketSettlementInput(usize),
    #[error("settlement output {0} is neither a jackpot nor a signature payout")]
    BadSettlementOutput(usize),
    #[error("jackpot mature days must be strictly increasing")]
    MatureDayCollision,
    #[error("settlement tickets span more than one purchase block")]
    MixedDrawBlocks,
    #[error("ticket purchased at block #{0} has not reached its draw")]
    TicketNotMature(BlockNum),
    #[error("drawing for block #{0} is not resolved")]
    DrawNotResolved(BlockNum),
    #[error("jackpot output exceeds the per-output maximum")]
    JackpotOutputTooLarge,
    #[error("jackpot input matures at block #{0}")]
    JackpotNotMature(u64),
    #[error("payouts for draw #{draw} exceed its total jackpot")]
    DrawBudgetExceeded { draw: BlockNum },
    #[error("settlement pays {paid} but its tickets won {won}")]
    SettlementPayoutMismatch { paid: u64, won: u64 },
}

/// Where a transaction arrived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    /// Submitted by a user inside the block body
    Ordinary,
    /// Generated by the chain alongside the block
    Settlement,
}

/// Validates transactions against the lottery spending rules. Borrows the
/// collaborators of the chain database that builds it.
pub struct TxValidator<'a, L: BaseLedger + ?Sized> {
    base: &'a L,
    store: &'a Storage,
    rule: &'a dyn JackpotRule,
}

impl<'a, L: BaseLedger + ?Sized> TxValidator<'a, L> {
    pub fn new(base: &'a L, store: &'a Storage, rule: &'a dyn JackpotRule) -> Self {
        Self { base, store, rule }
    }

    /// Validate one transaction, folding its effects into `block_state`.
    pub fn evaluate(
        &self,
        tx: &SignedTransaction,
        kind: TxKind,
        block_state: &mut BlockEvaluationState,
    ) -> Result<TxEvaluationState, ValidationError> {
        let mut state = TxEvaluationState::new();
        state.signed_by = self.signer_addresses(tx)?;

        let inputs: Vec<MetaInput> = tx
            .inputs
            .iter()
            .map(|input| self.base.resolve_input(input))
            .collect::<Result<_, _>>()?;

        let settles = inputs
            .iter()
            .any(|input| matches!(input.output.claim, Claim::Ticket(_)));
        match (settles, kind) {
            (true, TxKind::Ordinary) => return Err(ValidationError::UnexpectedSettlement),
            (false, TxKind::Settlement) => return Err(ValidationError::NotASettlement),
            _ => {}
        }
        if settles {
            check_settlement_shape(tx, &inputs)?;
        }

        for input in &inputs {
            self.validate_input(tx, input, &mut state, block_state)?;
        }
        for output in &tx.outputs {
            self.validate_output(output, &mut state)?;
        }
        state.balance()?;

        if settles {
            self.settle(tx, &inputs, &state, block_state)?;
        }
        block_state.add_ticket_sales(state.total_ticket_sales)?;

        state.inputs = inputs;
        Ok(state)
    }

    /// Jackpot a ticket resolves to, denominated in the ticket's unit.
    /// Requires the draw `DRAW_DELAY` blocks after purchase to be resolved.
    pub(crate) fn ticket_payout(
        &self,
        source: OutputIndex,
        ticket: &ClaimTicketOutput,
        amount: Asset,
    ) -> Result<Asset, ValidationError> {
        let draw = source.block_num.saturating_add(DRAW_DELAY);
        let mature = self.base.head_block_num().is_some_and(|head| head >= draw);
        if !mature {
            return Err(ValidationError::TicketNotMature(source.block_num));
        }
        let summary = self
            .store
            .block_summary(draw)?
            .ok_or(ValidationError::DrawNotResolved(draw))?;
        let record = self
            .store
            .drawing_record(draw)?
            .ok_or(ValidationError::DrawNotResolved(draw))?;
        let payout = self.rule.evaluate_jackpot(
            summary.winning_number,
            ticket.lucky_number,
            record.total_jackpot,
        );
        Ok(Asset::new(payout, amount.unit))
    }

    fn validate_input(
        &self,
        tx: &SignedTransaction,
        input: &MetaInput,
        state: &mut TxEvaluationState,
        block_state: &mut BlockEvaluationState,
    ) -> Result<(), ValidationError> {
        match &input.output.claim {
            // continuity is the secret-chain verifier's job
            Claim::Secret(_) => Ok(()),
            Claim::Ticket(ticket) => self.validate_ticket_input(input, ticket, state),
            Claim::Jackpot(jackpot) => {
                self.validate_jackpot_input(tx, input, jackpot, state, block_state)
            }
            Claim::Signature { owner } => {
                if !state.has_signature(owner) {
                    return Err(ValidationError::MissingSignature(*owner));
                }
                state.add_input_asset(input.output.amount)?;
                if input.output.amount.unit == VOTE_UNIT {
                    let amount = input.output.amount.amount;
                    block_state.add_input_delegate_votes(input.delegate_id, amount)?;
                    block_state.add_output_delegate_votes(tx.vote, amount)?;
                }
                Ok(())
            }
        }
    }

    fn validate_ticket_input(
        &self,
        input: &MetaInput,
        ticket: &ClaimTicketOutput,
        state: &mut TxEvaluationState,
    ) -> Result<(), ValidationError> {
        let payout = self.ticket_payout(input.source, ticket, input.output.amount)?;
        if payout.amount > 0 {
            // a winner: an implicit mint funded by the draw's budget
            state.add_input_asset(payout)?;
            state.add_ticket_winnings(payout.amount)?;
        }
        // zero is an ordinary losing ticket, not a failure
        Ok(())
    }

    fn validate_jackpot_input(
        &self,
        tx: &SignedTransaction,
        input: &MetaInput,
        claim: &ClaimJackpotOutput,
        state: &mut TxEvaluationState,
        block_state: &mut BlockEvaluationState,
    ) -> Result<(), ValidationError> {
        if !state.has_signature(&claim.owner) {
            return Err(ValidationError::MissingSignature(claim.owner));
        }
        let mature_at = u64::from(claim.mature_day) * u64::from(BLOCKS_PER_DAY)
            + u64::from(input.source.block_num);
        let head = self.base.head_block_num().map_or(0, u64::from);
        if head < mature_at {
            return Err(ValidationError::JackpotNotMature(mature_at));
        }
        state.add_input_asset(input.output.amount)?;
        if input.output.amount.unit == VOTE_UNIT {
            let amount = input.output.amount.amount;
            block_state.add_input_delegate_votes(input.delegate_id, amount)?;
            block_state.add_output_delegate_votes(tx.vote, amount)?;
        }
        Ok(())
    }

    fn validate_output(
        &self,
        output: &TxOutput,
        state: &mut TxEvaluationState,
    ) -> Result<(), ValidationError> {
        match &output.claim {
            Claim::Secret(_) => {
                if output.amount.amount != 0 {
                    return Err(ValidationError::NonZeroSecretAmount);
                }
                if state.found_secret_out {
                    return Err(ValidationError::DuplicateSecretOutput);
                }
                state.found_secret_out = true;
                Ok(())
            }
            Claim::Ticket(_) => {
                state.add_ticket_sale(output.amount.amount)?;
                state.add_output_asset(output.amount)?;
                Ok(())
            }
            Claim::Jackpot(_) => {
                if output.amount.amount > MAX_JACKPOT_OUTPUT {
                    return Err(ValidationError::JackpotOutputTooLarge);
                }
                state.add_output_asset(output.amount)?;
                Ok(())
            }
            Claim::Signature { .. } => {
                state.add_output_asset(output.amount)?;
                Ok(())
            }
        }
    }

    /// Register a settlement's payouts against its draw. The budget bound
    /// is cumulative across the whole block, so two settlements against the
    /// same draw cannot together overshoot it.
    fn settle(
        &self,
        tx: &SignedTransaction,
        inputs: &[MetaInput],
        state: &TxEvaluationState,
        block_state: &mut BlockEvaluationState,
    ) -> Result<(), ValidationError> {
        // the shape check pinned all tickets to one purchase block
        let first = inputs.first().ok_or(ValidationError::NotASettlement)?;
        let draw = first.source.block_num.saturating_add(DRAW_DELAY);

        let paid = tx.outputs.iter().try_fold(0u64, |acc, out| {
            acc.checked_add(out.amount.amount)
                .ok_or(BalanceError::Overflow)
        })?;
        if paid != state.ticket_winnings {
            return Err(ValidationError::SettlementPayoutMismatch {
                paid,
                won: state.ticket_winnings,
            });
        }

        let cumulative = block_state.add_draw_payout(draw, paid)?;
        let record = self
            .store
            .drawing_record(draw)?
            .ok_or(ValidationError::DrawNotResolved(draw))?;
        let total = record
            .total_paid
            .checked_add(cumulative)
            .ok_or(BalanceError::Overflow)?;
        if total > record.total_jackpot {
            return Err(ValidationError::DrawBudgetExceeded { draw });
        }
        block_state.add_amount_won(paid)?;
        Ok(())
    }

    fn signer_addresses(
        &self,
        tx: &SignedTransaction,
    ) -> Result<HashSet<Address>, ValidationError> {
        if tx.signatures.is_empty() {
            return Ok(HashSet::new());
        }
        let digest = tx.id()?;
        let mut signed = HashSet::with_capacity(tx.signatures.len());
        for sig in &tx.signatures {
            crypto::verify(&sig.pubkey, &digest, &sig.signature)
                .map_err(|_| ValidationError::BadSignature)?;
            signed.insert(Address::from_public_key(&sig.pubkey));
        }
        Ok(signed)
    }
}

/// Shape of a deterministic settlement: every input spends a ticket from the
/// same purchase block, every output is a jackpot or plain signature payout,
/// and jackpot mature days never collide.
pub(crate) fn check_settlement_shape(
    tx: &SignedTransaction,
    inputs: &[MetaInput],
) -> Result<(), ValidationError> {
    let mut purchase_block = None;
    for (idx, input) in inputs.iter().enumerate() {
        if !matches!(input.output.claim, Claim::Ticket(_)) {
            return Err(ValidationError::NonTicketSettlementInput(idx));
        }
        match purchase_block {
            None => purchase_block = Some(input.source.block_num),
            Some(num) if num == input.source.block_num => {}
            Some(_) => return Err(ValidationError::MixedDrawBlocks),
        }
    }

    let mut mature_days = Vec::new();
    for (idx, output) in tx.outputs.iter().enumerate() {
        match &output.claim {
            Claim::Jackpot(jackpot) => mature_days.push(jackpot.mature_day),
            Claim::Signature { .. } => {}
            _ => return Err(ValidationError::BadSettlementOutput(idx)),
        }
    }
    mature_days.sort_unstable();
    for pair in mature_days.windows(2) {
        if pair[1] - pair[0] < 1 {
            return Err(ValidationError::MatureDayCollision);
        }
    }
    Ok(())
}
