//! Transactions, outputs, and chain locations

use crate::claims::Claim;
use crate::crypto::{Keypair, sha3};
use crate::types::{Asset, BlockNum, DelegateId, Hash, PublicKey, Signature};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to an output by the transaction that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    pub tx_id: Hash,
    pub index: u16,
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(&self.tx_id[..8]), self.index)
    }
}

/// Position of an output in the chain
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OutputIndex {
    pub block_num: BlockNum,
    pub tx_idx: u16,
    pub output_idx: u16,
}

/// A spendable value under some claim condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub amount: Asset,
    pub claim: Claim,
}

/// Reference to the output a transaction spends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub output_ref: OutputRef,
}

/// Public key and detached signature over the transaction digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSignature {
    pub pubkey: PublicKey,
    pub signature: Signature,
}

/// A transaction with its signatures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Delegate this transaction's funds vote for
    pub vote: DelegateId,
    pub signatures: Vec<TxSignature>,
}

impl SignedTransaction {
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>, vote: DelegateId) -> Self {
        Self {
            inputs,
            outputs,
            vote,
            signatures: Vec::new(),
        }
    }

    /// Bytes covered by the transaction's signatures. Excludes the
    /// signatures themselves.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&(&self.inputs, &self.outputs, &self.vote))
    }

    pub fn id(&self) -> Result<Hash, bincode::Error> {
        Ok(sha3(&self.signing_bytes()?))
    }

    /// Append a signature over the transaction digest
    pub fn sign_with(&mut self, keypair: &Keypair) -> Result<(), bincode::Error> {
        let digest = self.id()?;
        self.signatures.push(TxSignature {
            pubkey: keypair.public.clone(),
            signature: keypair.sign(&digest),
        });
        Ok(())
    }
}

/// An input resolved against the unspent output it consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInput {
    /// The output being spent
    pub output: TxOutput,
    /// Where the output was committed
    pub source: OutputIndex,
    /// Delegate the output's funds voted for when committed
    pub delegate_id: DelegateId,
}

/// An unspent output together with both of its locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatedOutput {
    pub output_ref: OutputRef,
    pub source: OutputIndex,
    pub output: TxOutput,
}
