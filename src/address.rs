//! Base58Check addresses derived from ML-DSA public keys
//!
//! Text form: version prefix, then base58 of `payload || checksum` where the
//! payload is the first 20 bytes of SHA3-256(pubkey) and the checksum is the
//! first 4 bytes of SHA3-256(payload). Decoding accepts the retired prefix
//! for old wallets; encoding always emits the current one.

use crate::crypto::sha3;
use crate::types::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Current address prefix
pub const ADDRESS_PREFIX: &str = "TBL";

/// Retired prefix, still accepted on decode
pub const LEGACY_ADDRESS_PREFIX: &str = "XTB";

/// Payload length in bytes
pub const ADDRESS_LEN: usize = 20;

const CHECKSUM_LEN: usize = 4;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("unknown address prefix")]
    BadPrefix,
    #[error("invalid address length")]
    BadLength,
    #[error("address checksum mismatch")]
    BadChecksum,
    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),
}

/// 20-byte account identifier
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub fn from_public_key(pubkey: &PublicKey) -> Self {
        let digest = sha3(pubkey);
        let mut payload = [0u8; ADDRESS_LEN];
        payload.copy_from_slice(&digest[..ADDRESS_LEN]);
        Self(payload)
    }

    pub fn is_valid(encoded: &str) -> bool {
        encoded.parse::<Address>().is_ok()
    }
}

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha3(payload);
    let mut check = [0u8; CHECKSUM_LEN];
    check.copy_from_slice(&digest[..CHECKSUM_LEN]);
    check
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = [0u8; ADDRESS_LEN + CHECKSUM_LEN];
        data[..ADDRESS_LEN].copy_from_slice(&self.0);
        data[ADDRESS_LEN..].copy_from_slice(&checksum(&self.0));
        write!(f, "{}{}", ADDRESS_PREFIX, bs58::encode(data).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(ADDRESS_PREFIX)
            .or_else(|| s.strip_prefix(LEGACY_ADDRESS_PREFIX))
            .ok_or(AddressError::BadPrefix)?;
        let data = bs58::decode(body).into_vec()?;
        if data.len() != ADDRESS_LEN + CHECKSUM_LEN {
            return Err(AddressError::BadLength);
        }
        let (payload, check) = data.split_at(ADDRESS_LEN);
        if check != checksum(payload) {
            return Err(AddressError::BadChecksum);
        }
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(payload);
        Ok(Self(bytes))
    }
}
