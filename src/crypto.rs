use crate::types::{Hash, PublicKey, Signature};
use pqcrypto_dilithium::dilithium3 as dilithium;
use pqcrypto_traits::sign::{DetachedSignature, PublicKey as PkTrait, SecretKey as SkTrait};
use sha3::{Digest, Sha3_256};
use thiserror::Error;

pub const MLDSA65_PUBKEY_SIZE: usize = 1952;
pub const MLDSA65_SIG_SIZE: usize = 3293;
pub const MLDSA65_SECRET_SIZE: usize = 4000;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid public key")]
    InvalidPublicKey,
}

pub struct Keypair {
    pub public: PublicKey,
    secret: dilithium::SecretKey,
}

impl Keypair {
    pub fn generate() -> Self {
        let (pk, sk) = dilithium::keypair();
        Self {
            public: pk.as_bytes().to_vec(),
            secret: sk,
        }
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        let sig = dilithium::detached_sign(message, &self.secret);
        sig.as_bytes().to_vec()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn secret_bytes(&self) -> &[u8] {
        self.secret.as_bytes()
    }
}

pub fn verify(pubkey: &PublicKey, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
    let pk = dilithium::PublicKey::from_bytes(pubkey).map_err(|_| CryptoError::InvalidPublicKey)?;
    let sig = dilithium::DetachedSignature::from_bytes(signature).map_err(|_| CryptoError::InvalidSignature)?;
    dilithium::verify_detached_signature(&sig, message, &pk).map_err(|_| CryptoError::InvalidSignature)
}

pub fn sha3(data: &[u8]) -> Hash {
    Sha3_256::digest(data).into()
}

pub fn sha3_concat(a: &[u8], b: &[u8]) -> Hash {
    let mut hasher = Sha3_256::new();
    hasher.update(a);
    hasher.update(b);
    hasher.finalize().into()
}
