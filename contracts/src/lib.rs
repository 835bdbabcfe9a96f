//! # Assent Contracts
//!
//! A multi-token ledger where nobody receives tokens they did not agree to.
//! Minting takes one of two consent paths:
//!
//! - **Signed approval**: an externally-controlled recipient signs the
//!   digest of the exact mint parameters with its own key.
//! - **Receiver callback**: a programmable recipient answers a synchronous
//!   callback with the acceptance marker.
//!
//! Burns debit the holder and never go below zero. Metadata for every token
//! is reachable through one templated base URI.
//!
//! ## Design Principles
//!
//! 1. Balances are 256-bit and checked: overflow and underflow are errors,
//!    never wraps.
//! 2. Every entry point is atomic. A failed request leaves balances, events
//!    and metadata exactly as they were, including anything a reentrant
//!    receiver did in the meantime.
//! 3. External code runs before the effect it authorizes, never after.

pub mod burn;
pub mod error;
pub mod events;
pub mod ledger;
pub mod metadata;
pub mod mint;
pub mod multi_token;
pub mod receiver;
pub mod receivers;
pub mod snapshot;
pub mod verifier;

pub use error::ContractError;
pub use events::{EventLog, LedgerEvent};
pub use ledger::BalanceLedger;
pub use metadata::MetadataStore;
pub use multi_token::MultiToken;
pub use receiver::{
    mint_accepted_marker, mint_batch_accepted_marker, AcceptanceMarker, AcceptanceResult,
    ReceiverAcceptance, ReceiverError, ReceiverRegistry, Rejection, TokenReceiver,
};
pub use receivers::{SelectiveReceiver, TokenVault};
pub use snapshot::{BalanceEntry, LedgerSnapshot};
pub use verifier::{
    batch_digest, single_digest, ApprovalError, MintApproval, Secp256k1Recovery,
    SignatureVerifier, SignerRecovery,
};
