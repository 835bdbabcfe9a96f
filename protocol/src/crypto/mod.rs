//! # Cryptographic Primitives for Assent
//!
//! Everything the ledger needs to decide "did this account really approve
//! this mint?" lives here:
//!
//! - **Keccak-256** for digests, selectors and address derivation.
//! - **secp256k1 ECDSA with recovery** for approvals, in the `(v, r, s)`
//!   form standard wallets produce.
//! - **Personal-message prefixing**, so approvals signed with off-chain
//!   `personal_sign` tooling recover correctly.
//!
//! Everything here is a thin, type-safe wrapper around RustCrypto
//! implementations. No curve arithmetic is written by hand.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{keccak256, keccak256_multi, personal_message_hash, selector};
pub use keys::{address_from_verifying_key, AccountKeypair, KeyError};
pub use signatures::{recover_signer, RecoverableSignature, SignatureError};
