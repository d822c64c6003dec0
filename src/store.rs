//! Persistent lottery records
//!
//! Four sled trees keyed by big-endian block number or delegate id:
//! per-block summaries, drawing records, the per-delegate production index,
//! and the settlement journal that lets a pop reverse `total_paid` exactly.
//! A block's writes land in one cross-tree transaction, so the trees never
//! disagree about which blocks exist. Values are bincode (fixed-width
//! integers, declaration order), so records stay readable across versions
//! that keep the field layout.

use crate::drawing::{BlockSummary, DrawingRecord};
use crate::types::{BlockNum, DelegateId};
use sled::Transactional;
use sled::transaction::TransactionError;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage: {0}")]
    Sled(#[from] sled::Error),
    #[error("record encoding: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("missing block summary for #{0}")]
    MissingSummary(BlockNum),
    #[error("missing drawing record for #{0}")]
    MissingDraw(BlockNum),
    #[error("corrupt record key")]
    CorruptKey,
    #[error("delegate index out of sync for delegate {0}")]
    IndexOutOfSync(DelegateId),
}

fn key(num: u32) -> [u8; 4] {
    num.to_be_bytes()
}

fn transaction_error(err: TransactionError<StoreError>) -> StoreError {
    match err {
        TransactionError::Abort(err) => err,
        TransactionError::Storage(err) => StoreError::Sled(err),
    }
}

fn decode_key(bytes: &[u8]) -> Result<BlockNum, StoreError> {
    let arr: [u8; 4] = bytes.try_into().map_err(|_| StoreError::CorruptKey)?;
    Ok(BlockNum::from_be_bytes(arr))
}

/// Lottery record store, one writer at a time
pub struct Storage {
    db: sled::Db,
    summaries: sled::Tree,
    draws: sled::Tree,
    delegates: sled::Tree,
    journal: sled::Tree,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::from_db(sled::open(path)?)
    }

    /// In-memory store, discarded on drop
    pub fn temporary() -> Result<Self, StoreError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        Ok(Self {
            summaries: db.open_tree("block2summary")?,
            draws: db.open_tree("drawing2record")?,
            delegates: db.open_tree("delegate2blocks")?,
            journal: db.open_tree("settlement_journal")?,
            db,
        })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    /// Highest block number with a stored summary
    pub fn head_block_num(&self) -> Result<Option<BlockNum>, StoreError> {
        match self.summaries.last()? {
            Some((k, _)) => Ok(Some(decode_key(&k)?)),
            None => Ok(None),
        }
    }

    pub fn block_summary(&self, block_num: BlockNum) -> Result<Option<BlockSummary>, StoreError> {
        match self.summaries.get(key(block_num))? {
            Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn drawing_record(&self, block_num: BlockNum) -> Result<Option<DrawingRecord>, StoreError> {
        match self.draws.get(key(block_num))? {
            Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Block numbers produced by a delegate, in production order
    pub fn delegate_blocks(&self, delegate_id: DelegateId) -> Result<Vec<BlockNum>, StoreError> {
        match self.delegates.get(key(delegate_id))? {
            Some(raw) => Ok(bincode::deserialize(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Most recent block a delegate produced
    pub fn last_delegate_block(
        &self,
        delegate_id: DelegateId,
    ) -> Result<Option<BlockNum>, StoreError> {
        Ok(self.delegate_blocks(delegate_id)?.last().copied())
    }

    /// Per-draw payout deltas recorded when `block_num` was stored
    pub fn settlement_journal(
        &self,
        block_num: BlockNum,
    ) -> Result<Vec<(BlockNum, u64)>, StoreError> {
        match self.journal.get(key(block_num))? {
            Some(raw) => Ok(bincode::deserialize(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persist one block's records. All computation and checking is done by
    /// the caller; this applies every tree's writes in one transaction.
    pub fn commit_block(
        &self,
        block_num: BlockNum,
        delegate_id: DelegateId,
        summary: &BlockSummary,
        draws: &[(BlockNum, DrawingRecord)],
        journal: &[(BlockNum, u64)],
    ) -> Result<(), StoreError> {
        let mut produced = self.delegate_blocks(delegate_id)?;
        produced.push(block_num);

        // serialize up front; the closure may retry and must stay infallible
        let block_key = key(block_num);
        let delegate_key = key(delegate_id);
        let summary_raw = bincode::serialize(summary)?;
        let produced_raw = bincode::serialize(&produced)?;
        let journal_raw = match journal.is_empty() {
            true => None,
            false => Some(bincode::serialize(&journal)?),
        };
        let draw_rows = draws
            .iter()
            .map(|(num, record)| Ok((key(*num), bincode::serialize(record)?)))
            .collect::<Result<Vec<_>, bincode::Error>>()?;

        (&self.summaries, &self.draws, &self.journal, &self.delegates)
            .transaction(|(summaries, draws, journal, delegates)| {
                summaries.insert(&block_key, summary_raw.as_slice())?;
                for (num_key, raw) in &draw_rows {
                    draws.insert(num_key, raw.as_slice())?;
                }
                if let Some(raw) = &journal_raw {
                    journal.insert(&block_key, raw.as_slice())?;
                }
                delegates.insert(&delegate_key, produced_raw.as_slice())?;
                Ok(())
            })
            .map_err(transaction_error)
    }

    /// Remove one block's records and restore the decremented draw records
    /// computed by the caller from the settlement journal, in one
    /// transaction.
    pub fn revert_block(
        &self,
        block_num: BlockNum,
        delegate_id: DelegateId,
        draws: &[(BlockNum, DrawingRecord)],
    ) -> Result<(), StoreError> {
        let mut produced = self.delegate_blocks(delegate_id)?;
        match produced.pop() {
            Some(last) if last == block_num => {}
            _ => return Err(StoreError::IndexOutOfSync(delegate_id)),
        }

        let block_key = key(block_num);
        let delegate_key = key(delegate_id);
        let produced_raw = match produced.is_empty() {
            true => None,
            false => Some(bincode::serialize(&produced)?),
        };
        let draw_rows = draws
            .iter()
            .map(|(num, record)| Ok((key(*num), bincode::serialize(record)?)))
            .collect::<Result<Vec<_>, bincode::Error>>()?;

        (&self.summaries, &self.draws, &self.journal, &self.delegates)
            .transaction(|(summaries, draws, journal, delegates)| {
                summaries.remove(&block_key)?;
                draws.remove(&block_key)?;
                journal.remove(&block_key)?;
                for (num_key, raw) in &draw_rows {
                    draws.insert(num_key, raw.as_slice())?;
                }
                match &produced_raw {
                    Some(raw) => delegates.insert(&delegate_key, raw.as_slice())?,
                    None => delegates.remove(&delegate_key)?,
                };
                Ok(())
            })
            .map_err(transaction_error)
    }
}
