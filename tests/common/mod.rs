//! Shared test fixtures: an in-memory base ledger, a delegate secret chain,
//! and block builders driving a `TombolaDb`.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tombola::chain::ChainError;
use tombola::transaction::MetaInput;
use tombola::{
    Address, Asset, BaseLedger, Block, BlockHeader, BlockNum, Claim, ClaimSecretOutput,
    ClaimTicketOutput, DelegateId, Hash, JackpotRule, Keypair, LedgerError, LocatedOutput,
    OutputIndex, OutputRef, SignedTransaction, Storage, TombolaDb, TxInput, TxOutput, ZERO_HASH,
    sha3, sha3_concat,
};

struct UtxoEntry {
    output: TxOutput,
    source: OutputIndex,
    delegate_id: DelegateId,
}

struct Undo {
    spent: Vec<(OutputRef, UtxoEntry)>,
    created: Vec<OutputRef>,
}

/// Base ledger backed by plain maps. Only the pieces the lottery layer
/// calls through `BaseLedger` are modelled.
pub struct MemoryLedger {
    blocks: Vec<Block>,
    utxos: HashMap<OutputRef, UtxoEntry>,
    undo: Vec<Undo>,
    credits: u64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            utxos: HashMap::new(),
            undo: Vec::new(),
            credits: 0,
        }
    }

    /// Inject a spendable output outside any block, as if minted long ago.
    /// Returns the reference a transaction spends it by.
    pub fn credit(&mut self, output: TxOutput, source_block: BlockNum) -> OutputRef {
        self.credits += 1;
        let output_ref = OutputRef {
            tx_id: sha3(&self.credits.to_le_bytes()),
            index: 0,
        };
        let source = OutputIndex {
            block_num: source_block,
            tx_idx: u16::MAX,
            output_idx: 0,
        };
        self.utxos.insert(
            output_ref,
            UtxoEntry {
                output,
                source,
                delegate_id: 0,
            },
        );
        output_ref
    }

    pub fn block_id(&self, block_num: BlockNum) -> Option<Hash> {
        self.blocks.get(block_num as usize).map(|b| b.id())
    }

    pub fn contains_output(&self, output_ref: &OutputRef) -> bool {
        self.utxos.contains_key(output_ref)
    }
}

impl BaseLedger for MemoryLedger {
    fn head_block_num(&self) -> Option<BlockNum> {
        self.blocks.len().checked_sub(1).map(|n| n as BlockNum)
    }

    fn block_header(&self, block_num: BlockNum) -> Result<BlockHeader, LedgerError> {
        self.blocks
            .get(block_num as usize)
            .map(|b| b.header)
            .ok_or(LedgerError::UnknownBlock(block_num))
    }

    fn resolve_input(&self, input: &TxInput) -> Result<MetaInput, LedgerError> {
        let entry = self
            .utxos
            .get(&input.output_ref)
            .ok_or(LedgerError::UnknownOutput(input.output_ref))?;
        Ok(MetaInput {
            output: entry.output.clone(),
            source: entry.source,
            delegate_id: entry.delegate_id,
        })
    }

    fn ticket_outputs_at(&self, block_num: BlockNum) -> Result<Vec<LocatedOutput>, LedgerError> {
        Ok(self
            .utxos
            .iter()
            .filter(|(_, entry)| {
                entry.source.block_num == block_num
                    && matches!(entry.output.claim, Claim::Ticket(_))
            })
            .map(|(output_ref, entry)| LocatedOutput {
                output_ref: *output_ref,
                source: entry.source,
                output: entry.output.clone(),
            })
            .collect())
    }

    fn validate_block(
        &self,
        block: &Block,
        settlements: &[SignedTransaction],
    ) -> Result<(), LedgerError> {
        let expected = self.blocks.len() as BlockNum;
        if block.header.block_num != expected {
            return Err(LedgerError::Rejected(format!(
                "expected block #{expected}, got #{}",
                block.header.block_num
            )));
        }
        let expected_prev = self.blocks.last().map_or(ZERO_HASH, |b| b.id());
        if block.header.prev_hash != expected_prev {
            return Err(LedgerError::Rejected("prev hash mismatch".into()));
        }
        let mut seen = HashSet::new();
        for tx in block.transactions.iter().chain(settlements) {
            for input in &tx.inputs {
                if !seen.insert(input.output_ref) {
                    return Err(LedgerError::Rejected("double spend in block".into()));
                }
                if !self.utxos.contains_key(&input.output_ref) {
                    return Err(LedgerError::UnknownOutput(input.output_ref));
                }
            }
        }
        Ok(())
    }

    fn store_block(
        &mut self,
        block: &Block,
        settlements: &[SignedTransaction],
    ) -> Result<(), LedgerError> {
        let num = block.header.block_num;
        let mut undo = Undo {
            spent: Vec::new(),
            created: Vec::new(),
        };
        for (tx_idx, tx) in block.transactions.iter().chain(settlements).enumerate() {
            for input in &tx.inputs {
                let entry = self
                    .utxos
                    .remove(&input.output_ref)
                    .ok_or(LedgerError::UnknownOutput(input.output_ref))?;
                undo.spent.push((input.output_ref, entry));
            }
            let tx_id = tx
                .id()
                .map_err(|e| LedgerError::Rejected(e.to_string()))?;
            for (output_idx, output) in tx.outputs.iter().enumerate() {
                let output_ref = OutputRef {
                    tx_id,
                    index: output_idx as u16,
                };
                let source = OutputIndex {
                    block_num: num,
                    tx_idx: tx_idx as u16,
                    output_idx: output_idx as u16,
                };
                self.utxos.insert(
                    output_ref,
                    UtxoEntry {
                        output: output.clone(),
                        source,
                        delegate_id: tx.vote,
                    },
                );
                undo.created.push(output_ref);
            }
        }
        self.blocks.push(block.clone());
        self.undo.push(undo);
        Ok(())
    }

    fn pop_block(&mut self) -> Result<Block, LedgerError> {
        let block = self
            .blocks
            .pop()
            .ok_or_else(|| LedgerError::Rejected("empty chain".into()))?;
        let undo = self
            .undo
            .pop()
            .ok_or_else(|| LedgerError::Rejected("missing undo record".into()))?;
        for output_ref in &undo.created {
            self.utxos.remove(output_ref);
        }
        for (output_ref, entry) in undo.spent {
            self.utxos.insert(output_ref, entry);
        }
        Ok(block)
    }
}

/// One delegate's secret chain. Reveals are derived from the delegate id,
/// so the whole schedule is reproducible.
pub struct DelegateChain {
    pub delegate_id: DelegateId,
    produced: u32,
}

impl DelegateChain {
    pub fn new(delegate_id: DelegateId) -> Self {
        Self {
            delegate_id,
            produced: 0,
        }
    }

    fn secret(&self, n: u32) -> Hash {
        sha3_concat(&self.delegate_id.to_le_bytes(), &n.to_le_bytes())
    }

    /// Reveal and commitment for the next block this delegate produces.
    /// Does not advance the chain; call `commit` once the block is stored.
    pub fn next_reveal(&self) -> (Hash, Hash) {
        let next = self.produced + 1;
        let revealed = if next == 1 {
            ZERO_HASH
        } else {
            self.secret(next - 1)
        };
        (revealed, sha3(&self.secret(next)))
    }

    pub fn commit(&mut self) {
        self.produced += 1;
    }

    /// Roll the schedule back one block, pairing with a chain pop
    pub fn uncommit(&mut self) {
        self.produced -= 1;
    }
}

/// Assemble a block: the delegate's secret transaction first, then `extra`
pub fn build_block(
    num: BlockNum,
    prev_hash: Hash,
    delegate: &DelegateChain,
    extra: Vec<SignedTransaction>,
) -> Block {
    let (revealed, commitment) = delegate.next_reveal();
    let secret_out = TxOutput {
        amount: Asset::votes(0),
        claim: Claim::Secret(ClaimSecretOutput {
            secret: commitment,
            revealed_secret: revealed,
            delegate_id: delegate.delegate_id,
        }),
    };
    let mut transactions = vec![SignedTransaction::new(Vec::new(), vec![secret_out], 0)];
    transactions.extend(extra);
    Block {
        header: BlockHeader {
            block_num: num,
            prev_hash,
            timestamp: 1_756_000_000 + u64::from(num) * 60,
            delegate_id: delegate.delegate_id,
            secret: commitment,
            revealed_secret: revealed,
        },
        transactions,
    }
}

/// Plain signature-claimed output owned by `keypair`
pub fn signature_output(keypair: &Keypair, amount: u64) -> TxOutput {
    TxOutput {
        amount: Asset::votes(amount),
        claim: Claim::Signature {
            owner: Address::from_public_key(&keypair.public),
        },
    }
}

/// Spend `funding` on a ticket, with optional signature change
pub fn ticket_purchase(
    funding: OutputRef,
    keypair: &Keypair,
    lucky_number: u64,
    ticket_amount: u64,
    change: u64,
) -> SignedTransaction {
    let owner = Address::from_public_key(&keypair.public);
    let mut outputs = vec![TxOutput {
        amount: Asset::votes(ticket_amount),
        claim: Claim::Ticket(ClaimTicketOutput {
            lucky_number,
            owner,
            odds: 1,
        }),
    }];
    if change > 0 {
        outputs.push(TxOutput {
            amount: Asset::votes(change),
            claim: Claim::Signature { owner },
        });
    }
    let mut tx = SignedTransaction::new(vec![TxInput { output_ref: funding }], outputs, 0);
    tx.sign_with(keypair).unwrap();
    tx
}

/// Rule with a scripted outcome: the whole pool becomes the budget of one
/// chosen draw, and every ticket wins a fixed amount from a funded draw.
/// Makes winning deterministic without grinding lucky numbers.
pub struct ScriptedRule {
    pub draw: BlockNum,
    pub ticket_payout: u64,
}

impl JackpotRule for ScriptedRule {
    fn evaluate_total_jackpot(
        &self,
        _winning_number: u64,
        block_num: BlockNum,
        available_pool: u64,
    ) -> u64 {
        if block_num == self.draw {
            available_pool
        } else {
            0
        }
    }

    fn evaluate_jackpot(&self, _winning_number: u64, _lucky_number: u64, total_jackpot: u64) -> u64 {
        self.ticket_payout.min(total_jackpot)
    }
}

/// A single-delegate chain over the in-memory ledger
pub struct Harness {
    pub db: TombolaDb<MemoryLedger>,
    pub delegate: DelegateChain,
}

impl Harness {
    pub fn new(rule: Arc<dyn JackpotRule>) -> Self {
        let store = Storage::temporary().unwrap();
        let db = TombolaDb::with_store(store, MemoryLedger::new(), rule);
        Self {
            db,
            delegate: DelegateChain::new(7),
        }
    }

    /// Candidate for the next block from this harness's delegate
    pub fn next_block(&self, extra: Vec<SignedTransaction>) -> Block {
        let num = self.db.head_block_num().unwrap().map_or(0, |h| h + 1);
        let prev_hash = if num == 0 {
            ZERO_HASH
        } else {
            self.db.base().block_id(num - 1).unwrap()
        };
        build_block(num, prev_hash, &self.delegate, extra)
    }

    /// Validate and store the next block alongside its generated settlements
    pub fn advance(
        &mut self,
        extra: Vec<SignedTransaction>,
    ) -> Result<(Block, Vec<SignedTransaction>), ChainError> {
        let settlements = self.db.generate_settlements()?;
        let block = self.next_block(extra);
        let state = self.db.validate(&block, &settlements)?;
        self.db.store(&block, &settlements, &state)?;
        self.delegate.commit();
        Ok((block, settlements))
    }

    pub fn advance_many(&mut self, count: u32) {
        for _ in 0..count {
            self.advance(Vec::new()).unwrap();
        }
    }

    pub fn credit(&mut self, output: TxOutput, source_block: BlockNum) -> OutputRef {
        self.db.base_mut().credit(output, source_block)
    }
}
