//! Base ledger seam
//!
//! Generic UTXO bookkeeping stays behind this trait: block linkage, output
//! existence and double-spend checks, plain balances, and fees. The lottery
//! engine layers its own records on top and calls through at each lifecycle
//! step.

use crate::block::{Block, BlockHeader};
use crate::transaction::{LocatedOutput, MetaInput, SignedTransaction, TxInput};
use crate::types::BlockNum;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("unknown block #{0}")]
    UnknownBlock(BlockNum),
    #[error("unknown or spent output {0}")]
    UnknownOutput(crate::transaction::OutputRef),
    #[error("rejected by base ledger: {0}")]
    Rejected(String),
}

pub trait BaseLedger {
    /// Number of the most recently stored block, if any
    fn head_block_num(&self) -> Option<BlockNum>;

    /// Header of a stored block
    fn block_header(&self, block_num: BlockNum) -> Result<BlockHeader, LedgerError>;

    /// Resolve an input against the unspent output it consumes
    fn resolve_input(&self, input: &TxInput) -> Result<MetaInput, LedgerError>;

    /// Unspent ticket outputs committed at `block_num`
    fn ticket_outputs_at(&self, block_num: BlockNum) -> Result<Vec<LocatedOutput>, LedgerError>;

    /// Generic validation of a candidate block and its settlement set
    fn validate_block(
        &self,
        block: &Block,
        settlements: &[SignedTransaction],
    ) -> Result<(), LedgerError>;

    /// Commit a validated block's generic effects
    fn store_block(
        &mut self,
        block: &Block,
        settlements: &[SignedTransaction],
    ) -> Result<(), LedgerError>;

    /// Undo the most recent `store_block`, returning the popped block
    fn pop_block(&mut self) -> Result<Block, LedgerError>;
}
