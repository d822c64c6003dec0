//! Delegate commit-reveal verification
//!
//! Every block a delegate produces commits to a fresh secret and reveals the
//! previous one. The reveal must open the commitment from that delegate's
//! last block; a first block reveals the all-zero hash. Breaking the chain
//! rejects the whole candidate block.

use crate::block::Block;
use crate::claims::ClaimSecretOutput;
use crate::crypto::sha3;
use crate::types::{Hash, ZERO_HASH};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SecretChainError {
    #[error("first block of a delegate must reveal the empty secret")]
    FirstBlockReveal,
    #[error("revealed secret does not open the previous commitment")]
    BrokenChain,
    #[error("block carries no secret output")]
    MissingSecret,
    #[error("block carries more than one secret output")]
    MultipleSecrets,
    #[error("secret output does not match the block header")]
    HeaderMismatch,
}

/// Check a reveal against the producing delegate's previous commitment.
/// `prev_commitment` is `None` for the delegate's first block.
pub fn verify_continuity(
    prev_commitment: Option<&Hash>,
    revealed: &Hash,
) -> Result<(), SecretChainError> {
    match prev_commitment {
        None => {
            if *revealed != ZERO_HASH {
                return Err(SecretChainError::FirstBlockReveal);
            }
        }
        Some(commitment) => {
            if sha3(revealed) != *commitment {
                return Err(SecretChainError::BrokenChain);
            }
        }
    }
    Ok(())
}

/// Require exactly one secret output in the block, mirroring the header's
/// commitment fields and delegate.
pub fn check_block_secret(block: &Block) -> Result<ClaimSecretOutput, SecretChainError> {
    let mut outputs = block.secret_outputs();
    let secret = *outputs.next().ok_or(SecretChainError::MissingSecret)?;
    if outputs.next().is_some() {
        return Err(SecretChainError::MultipleSecrets);
    }
    let header = &block.header;
    if secret.secret != header.secret
        || secret.revealed_secret != header.revealed_secret
        || secret.delegate_id != header.delegate_id
    {
        return Err(SecretChainError::HeaderMismatch);
    }
    Ok(secret)
}
