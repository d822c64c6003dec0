pub mod address;
pub mod block;
pub mod chain;
pub mod claims;
pub mod crypto;
pub mod drawing;
pub mod ledger;
pub mod operations;
pub mod rule;
pub mod secret_chain;
pub mod state;
pub mod store;
pub mod transaction;
pub mod types;
pub mod validator;

pub use address::Address;
pub use block::{Block, BlockHeader};
pub use chain::{ChainError, TombolaDb};
pub use claims::{Claim, ClaimJackpotOutput, ClaimSecretOutput, ClaimTicketOutput};
pub use crypto::{Keypair, sha3, sha3_concat, verify};
pub use drawing::{BlockSummary, DrawingRecord};
pub use ledger::{BaseLedger, LedgerError};
pub use rule::{JackpotRule, PoolShareRule};
pub use state::BlockEvaluationState;
pub use store::Storage;
pub use transaction::{LocatedOutput, OutputIndex, OutputRef, SignedTransaction, TxInput, TxOutput};
pub use types::*;
pub use validator::{TxKind, TxValidator, ValidationError};
