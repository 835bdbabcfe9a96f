//! # Hashing Utilities
//!
//! Keccak-256 is the only hash function Assent needs. It is what standard
//! wallets use for `personal_sign`, for address derivation and for callback
//! selectors, so anything that has to interoperate with off-chain signing
//! tools goes through here.
//!
//! Note that Keccak-256 is *not* FIPS-202 SHA3-256: the padding differs, so
//! the two produce different digests for the same input. We use the
//! `Keccak256` type from the `sha3` crate, never `Sha3_256`.

use sha3::{Digest, Keccak256};

use crate::config::{PERSONAL_MESSAGE_PREFIX, SELECTOR_LENGTH};

/// Compute the Keccak-256 hash of the input data.
///
/// # Example
///
/// ```
/// use assent_protocol::crypto::keccak256;
///
/// let hash = keccak256(b"");
/// assert_eq!(
///     hex::encode(hash),
///     "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Equivalent to `keccak256(parts.concat())`, which is exactly the
/// packed encoding the approval digests are defined over.
pub fn keccak256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Wrap a 32-byte digest as a "personal" signed message and hash it again.
///
/// This is the double hash wallets compute for `personal_sign` over a
/// 32-byte payload: `keccak256(PREFIX || digest)`. Recovery always runs over
/// this value, never over the raw digest.
pub fn personal_message_hash(digest: &[u8; 32]) -> [u8; 32] {
    keccak256_multi(&[PERSONAL_MESSAGE_PREFIX, digest.as_slice()])
}

/// Derive a 4-byte selector from a canonical function signature, e.g.
/// `"onMintReceived(address,uint256,uint256,bytes)"`.
pub fn selector(signature: &str) -> [u8; SELECTOR_LENGTH] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; SELECTOR_LENGTH];
    out.copy_from_slice(&hash[..SELECTOR_LENGTH]);
    out
}
