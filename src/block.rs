//! Blocks and headers

use crate::claims::{Claim, ClaimSecretOutput};
use crate::transaction::SignedTransaction;
use crate::types::{BlockNum, DelegateId, Hash};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub block_num: BlockNum,
    pub prev_hash: Hash,
    pub timestamp: u64,
    /// Delegate that produced this block
    pub delegate_id: DelegateId,
    /// hash(S[n]): commitment opened by this delegate's next block
    pub secret: Hash,
    /// S[n-1]: opens the commitment from this delegate's previous block
    pub revealed_secret: Hash,
}

impl BlockHeader {
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha3_256::new();
        hasher.update(self.block_num.to_le_bytes());
        hasher.update(self.prev_hash);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.delegate_id.to_le_bytes());
        hasher.update(self.secret);
        hasher.update(self.revealed_secret);
        hasher.finalize().into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<SignedTransaction>,
}

impl Block {
    pub fn id(&self) -> Hash {
        self.header.hash()
    }

    /// Secret outputs carried by the block's transactions
    pub fn secret_outputs(&self) -> impl Iterator<Item = &ClaimSecretOutput> {
        self.transactions
            .iter()
            .flat_map(|tx| tx.outputs.iter())
            .filter_map(|out| match &out.claim {
                Claim::Secret(secret) => Some(secret),
                _ => None,
            })
    }
}
