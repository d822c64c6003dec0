//! Lottery chain database layered over a base ledger
//!
//! `TombolaDb` owns the derived lottery state (block summaries, drawing
//! records, delegate production indexes, settlement journals) and keeps it
//! in lock-step with the base chain through validate/store/pop_block.

use crate::block::Block;
use crate::claims::{Claim, ClaimJackpotOutput, ClaimTicketOutput};
use crate::drawing::{self, BlockSummary, DrawingError, DrawingRecord};
use crate::ledger::{BaseLedger, LedgerError};
use crate::rule::JackpotRule;
use crate::secret_chain::{self, SecretChainError};
use crate::state::BlockEvaluationState;
use crate::store::{Storage, StoreError};
use crate::transaction::{OutputIndex, SignedTransaction, TxInput, TxOutput};
use crate::types::{Asset, BlockNum, DRAW_DELAY, DelegateId, MAX_JACKPOT_OUTPUT, SECRET_WINDOW};
use crate::validator::{TxKind, TxValidator, ValidationError};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Secret(#[from] SecretChainError),
    #[error(transparent)]
    Drawing(#[from] DrawingError),
    #[error("expected block #{expected}, got #{got}")]
    OutOfOrder { expected: BlockNum, got: BlockNum },
    #[error("cannot pop an empty chain")]
    EmptyChain,
    #[error("base ledger at #{got} while the lottery head is #{head}")]
    HeadMismatch { head: BlockNum, got: BlockNum },
    #[error("journal reverts more than draw #{0} ever paid")]
    JournalUnderflow(BlockNum),
}

/// The lottery extension of the chain. Generic over the base ledger so the
/// full node and the test harness plug in the same way.
pub struct TombolaDb<L: BaseLedger> {
    base: L,
    store: Storage,
    rule: Arc<dyn JackpotRule>,
}

impl<L: BaseLedger> TombolaDb<L> {
    pub fn open(
        path: impl AsRef<Path>,
        base: L,
        rule: Arc<dyn JackpotRule>,
    ) -> Result<Self, ChainError> {
        Ok(Self::with_store(Storage::open(path)?, base, rule))
    }

    /// Layer over an already opened store
    pub fn with_store(store: Storage, base: L, rule: Arc<dyn JackpotRule>) -> Self {
        Self { base, store, rule }
    }

    /// Flush derived state to disk
    pub fn close(&self) -> Result<(), ChainError> {
        self.store.flush()?;
        Ok(())
    }

    pub fn base(&self) -> &L {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut L {
        &mut self.base
    }

    pub fn head_block_num(&self) -> Result<Option<BlockNum>, ChainError> {
        Ok(self.store.head_block_num()?)
    }

    pub fn block_summary(&self, block_num: BlockNum) -> Result<Option<BlockSummary>, ChainError> {
        Ok(self.store.block_summary(block_num)?)
    }

    pub fn drawing_record(&self, block_num: BlockNum) -> Result<Option<DrawingRecord>, ChainError> {
        Ok(self.store.drawing_record(block_num)?)
    }

    /// Blocks a delegate has produced, in production order
    pub fn delegate_blocks(&self, delegate_id: DelegateId) -> Result<Vec<BlockNum>, ChainError> {
        Ok(self.store.delegate_blocks(delegate_id)?)
    }

    /// Winning number drawn at `block_num`, if that block is stored
    pub fn winning_number(&self, block_num: BlockNum) -> Result<Option<u64>, ChainError> {
        Ok(self
            .store
            .block_summary(block_num)?
            .map(|summary| summary.winning_number))
    }

    /// Carry-over pool after the head block's draw, zero on an empty chain
    pub fn jackpot_pool(&self) -> Result<u64, ChainError> {
        match self.store.head_block_num()? {
            Some(head) => {
                let record = self
                    .store
                    .drawing_record(head)?
                    .ok_or(StoreError::MissingDraw(head))?;
                Ok(record.jackpot_pool)
            }
            None => Ok(0),
        }
    }

    /// Validate a candidate head block and its settlement set. Reads stored
    /// state but never writes it; the returned accumulator feeds `store`.
    pub fn validate(
        &self,
        block: &Block,
        settlements: &[SignedTransaction],
    ) -> Result<BlockEvaluationState, ChainError> {
        self.base.validate_block(block, settlements)?;
        secret_chain::check_block_secret(block)?;

        let prev_commitment = match self.store.last_delegate_block(block.header.delegate_id)? {
            Some(prev) => Some(self.base.block_header(prev)?.secret),
            None => None,
        };
        secret_chain::verify_continuity(prev_commitment.as_ref(), &block.header.revealed_secret)?;

        let validator = TxValidator::new(&self.base, &self.store, self.rule.as_ref());
        let mut state = BlockEvaluationState::new();
        for tx in &block.transactions {
            validator.evaluate(tx, TxKind::Ordinary, &mut state)?;
        }
        for tx in settlements {
            validator.evaluate(tx, TxKind::Settlement, &mut state)?;
        }
        Ok(state)
    }

    /// Commit a validated block. `state` must come from `validate` on the
    /// same block and settlement set.
    pub fn store(
        &mut self,
        block: &Block,
        settlements: &[SignedTransaction],
        state: &BlockEvaluationState,
    ) -> Result<(), ChainError> {
        let num = block.header.block_num;
        let expected = match self.store.head_block_num()? {
            Some(head) => head.saturating_add(1),
            None => 0,
        };
        if num != expected {
            return Err(ChainError::OutOfOrder { expected, got: num });
        }

        // every record is derived before either layer commits

        // reveals from the trailing window, newest first, clamped at genesis
        let mut prior = Vec::new();
        let mut back = 1;
        while back < SECRET_WINDOW && back <= num {
            prior.push(self.base.block_header(num - back)?.revealed_secret);
            back += 1;
        }
        let winning = drawing::winning_number(&block.header.revealed_secret, &prior);

        let summary = BlockSummary {
            winning_number: winning,
            ticket_sales: state.ticket_sales,
            amount_won: state.amount_won,
        };
        let prev_pool = if num == 0 {
            0
        } else {
            self.store
                .drawing_record(num - 1)?
                .ok_or(StoreError::MissingDraw(num - 1))?
                .jackpot_pool
        };
        let record =
            DrawingRecord::next(self.rule.as_ref(), winning, num, prev_pool, state.ticket_sales)?;

        // settlements only reference draws strictly before this block, so
        // the new record never collides with a touched one
        let mut draws = vec![(num, record)];
        let mut journal = Vec::with_capacity(state.draw_payouts.len());
        for (&draw, &paid) in &state.draw_payouts {
            let mut touched = self
                .store
                .drawing_record(draw)?
                .ok_or(StoreError::MissingDraw(draw))?;
            touched.record_payout(paid)?;
            draws.push((draw, touched));
            journal.push((draw, paid));
        }

        self.base.store_block(block, settlements)?;
        self.store
            .commit_block(num, block.header.delegate_id, &summary, &draws, &journal)?;
        info!(
            "Stored lottery block #{} (delegate {}, winning {}, sales {}, won {}, pool {})",
            num,
            block.header.delegate_id,
            winning,
            state.ticket_sales,
            state.amount_won,
            record.jackpot_pool
        );
        Ok(())
    }

    /// Undo the most recent block, restoring the state `store` started from
    pub fn pop_block(&mut self) -> Result<Block, ChainError> {
        let head = self
            .store
            .head_block_num()?
            .ok_or(ChainError::EmptyChain)?;
        // both layers must agree on the head before either pops
        match self.base.head_block_num() {
            Some(got) if got == head => {}
            Some(got) => return Err(ChainError::HeadMismatch { head, got }),
            None => return Err(ChainError::EmptyChain),
        }
        let block = self.base.pop_block()?;

        let journal = self.store.settlement_journal(head)?;
        let mut draws = Vec::with_capacity(journal.len());
        for (draw, paid) in journal {
            let mut touched = self
                .store
                .drawing_record(draw)?
                .ok_or(StoreError::MissingDraw(draw))?;
            touched.total_paid = touched
                .total_paid
                .checked_sub(paid)
                .ok_or(ChainError::JournalUnderflow(draw))?;
            draws.push((draw, touched));
        }

        self.store
            .revert_block(head, block.header.delegate_id, &draws)?;
        info!(
            "Popped lottery block #{} (delegate {})",
            head, block.header.delegate_id
        );
        Ok(block)
    }

    /// Jackpot a stored ticket currently claims, in the ticket's unit
    pub fn jackpot_for_ticket(
        &self,
        source: OutputIndex,
        ticket: &ClaimTicketOutput,
        amount: Asset,
    ) -> Result<Asset, ChainError> {
        let validator = TxValidator::new(&self.base, &self.store, self.rule.as_ref());
        Ok(validator.ticket_payout(source, ticket, amount)?)
    }

    /// Settlements for the tickets whose draw resolves at the current head.
    /// Every node derives the same transactions from the same chain, so a
    /// block producer and its validators agree without coordination.
    pub fn generate_settlements(&self) -> Result<Vec<SignedTransaction>, ChainError> {
        let Some(head) = self.store.head_block_num()? else {
            return Ok(Vec::new());
        };
        if head < DRAW_DELAY {
            return Ok(Vec::new());
        }
        let purchased = head - DRAW_DELAY;
        let draw = head;

        let summary = self
            .store
            .block_summary(draw)?
            .ok_or(StoreError::MissingSummary(draw))?;
        let record = self
            .store
            .drawing_record(draw)?
            .ok_or(StoreError::MissingDraw(draw))?;

        let mut tickets = self.base.ticket_outputs_at(purchased)?;
        tickets.sort_by_key(|located| located.source);

        let mut inputs = Vec::new();
        let mut outputs: Vec<TxOutput> = Vec::new();
        let mut payout_total = 0u64;
        for located in tickets {
            let Claim::Ticket(ticket) = &located.output.claim else {
                continue;
            };
            let payout = self.rule.evaluate_jackpot(
                summary.winning_number,
                ticket.lucky_number,
                record.total_jackpot,
            );
            if payout == 0 {
                continue;
            }
            let cumulative = payout_total
                .checked_add(payout)
                .ok_or(DrawingError::PoolOverflow)?;
            let committed = record
                .total_paid
                .checked_add(cumulative)
                .ok_or(DrawingError::PoolOverflow)?;
            if committed > record.total_jackpot {
                break;
            }
            // a payout above the per-output cap spans several outputs
            let chunks = payout.div_ceil(MAX_JACKPOT_OUTPUT) as usize;
            if outputs.len() + chunks > usize::from(u16::MAX) {
                break;
            }
            payout_total = cumulative;
            inputs.push(TxInput {
                output_ref: located.output_ref,
            });
            let mut remaining = payout;
            while remaining > 0 {
                let amount = remaining.min(MAX_JACKPOT_OUTPUT);
                remaining -= amount;
                // staggered maturity keeps the payout schedule collision-free
                outputs.push(TxOutput {
                    amount: Asset::new(amount, located.output.amount.unit),
                    claim: Claim::Jackpot(ClaimJackpotOutput {
                        owner: ticket.owner,
                        mature_day: (outputs.len() + 1) as u16,
                    }),
                });
            }
        }

        if outputs.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![SignedTransaction::new(inputs, outputs, 0)])
    }
}
