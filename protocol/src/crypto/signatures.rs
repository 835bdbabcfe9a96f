//! # Recoverable Signatures
//!
//! secp256k1 ECDSA signatures in the `(v, r, s)` form that wallets emit, and
//! signer recovery over personal-message digests.
//!
//! Nobody hands the ledger a public key. A signature arrives together with
//! the parameters it supposedly approves; we recompute the digest, recover
//! whichever key produced the signature, derive its address and compare.
//!
//! ## Failure is a value
//!
//! [`recover_signer`] never panics and never returns a distinguishable
//! error: a malformed `v`, an out-of-range scalar or a point that fails to
//! recover all come back as `None`. Callers treat `None` exactly like a
//! signature from the wrong account.

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::hash::personal_message_hash;
use super::keys::address_from_verifying_key;
use crate::config::{RECOVERY_ID_OFFSET, SIGNATURE_LENGTH};
use crate::types::Address;

/// Errors during signature parsing or production.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature bytes: expected 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid signature hex")]
    InvalidHex,

    #[error("signing failed")]
    SigningFailed,
}

/// A recoverable signature: `r` and `s` as 32-byte big-endian scalars plus
/// the `v` recovery byte (`27/28` or `0/1`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature {
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl RecoverableSignature {
    /// Builds a signature from its components without validating them.
    /// Validation happens at recovery time.
    pub fn new(v: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self { v, r, s }
    }

    pub(crate) fn from_parts(signature: &EcdsaSignature, recovery_id: RecoveryId) -> Self {
        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self {
            v: recovery_id.to_byte() + RECOVERY_ID_OFFSET,
            r,
            s,
        }
    }

    /// Parses the 65-byte wire layout `r || s || v`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { v: bytes[64], r, s })
    }

    /// Serializes to `r || s || v`.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// `0x`-prefixed lowercase hex of [`to_bytes`](Self::to_bytes).
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Normalized recovery id, or `None` if `v` is not one of `0, 1, 27, 28`.
    pub fn recovery_id(&self) -> Option<RecoveryId> {
        let normalized = match self.v {
            0 | 1 => self.v,
            27 | 28 => self.v - RECOVERY_ID_OFFSET,
            _ => return None,
        };
        RecoveryId::from_byte(normalized)
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}

impl FromStr for RecoverableSignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| SignatureError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for RecoverableSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Recovers the account that signed `digest` as a personal message.
///
/// Returns `None` for any malformed or unrecoverable signature.
pub fn recover_signer(digest: &[u8; 32], signature: &RecoverableSignature) -> Option<Address> {
    let recovery_id = match signature.recovery_id() {
        Some(id) => id,
        None => {
            tracing::trace!(v = signature.v, "rejecting signature with invalid recovery byte");
            return None;
        }
    };

    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);
    let ecdsa = EcdsaSignature::from_slice(&rs).ok()?;

    let prehash = personal_message_hash(digest);
    match VerifyingKey::recover_from_prehash(&prehash, &ecdsa, recovery_id) {
        Ok(key) => Some(address_from_verifying_key(&key)),
        Err(_) => {
            tracing::trace!("public key recovery failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{keccak256, AccountKeypair};

    #[test]
    fn test_sign_and_recover() {
        let kp = AccountKeypair::generate();
        let digest = keccak256(b"hello, ledger");
        let sig = kp.sign_digest(&digest).unwrap();
        assert_eq!(recover_signer(&digest, &sig), Some(kp.address()));
    }

    #[test]
    fn test_signing_emits_wallet_style_v() {
        let kp = AccountKeypair::generate();
        let sig = kp.sign_digest(&keccak256(b"v byte")).unwrap();
        assert!(sig.v == 27 || sig.v == 28);
    }

    #[test]
    fn test_zero_one_v_also_accepted() {
        let kp = AccountKeypair::generate();
        let digest = keccak256(b"legacy v");
        let mut sig = kp.sign_digest(&digest).unwrap();
        sig.v -= RECOVERY_ID_OFFSET;
        assert_eq!(recover_signer(&digest, &sig), Some(kp.address()));
    }

    #[test]
    fn test_wrong_digest_recovers_someone_else() {
        let kp = AccountKeypair::generate();
        let sig = kp.sign_digest(&keccak256(b"approve 10")).unwrap();
        let other = keccak256(b"approve 11");
        assert_ne!(recover_signer(&other, &sig), Some(kp.address()));
    }

    #[test]
    fn test_wrong_expected_signer_fails() {
        let kp1 = AccountKeypair::generate();
        let kp2 = AccountKeypair::generate();
        let digest = keccak256(b"who signed this");
        let sig = kp1.sign_digest(&digest).unwrap();
        assert_ne!(recover_signer(&digest, &sig), Some(kp2.address()));
    }

    #[test]
    fn test_malformed_signatures_yield_none() {
        let digest = keccak256(b"garbage in");
        // Zero scalars are out of range.
        assert_eq!(recover_signer(&digest, &RecoverableSignature::new(27, [0; 32], [0; 32])), None);
        // Scalars above the curve order.
        assert_eq!(
            recover_signer(&digest, &RecoverableSignature::new(27, [0xff; 32], [0xff; 32])),
            None
        );
        // Unknown recovery byte.
        let kp = AccountKeypair::generate();
        let mut sig = kp.sign_digest(&digest).unwrap();
        sig.v = 35;
        assert_eq!(recover_signer(&digest, &sig), None);
    }

    #[test]
    fn test_wire_roundtrip() {
        let kp = AccountKeypair::generate();
        let sig = kp.sign_digest(&keccak256(b"wire")).unwrap();
        let bytes = sig.to_bytes();
        assert_eq!(bytes.len(), SIGNATURE_LENGTH);
        assert_eq!(RecoverableSignature::from_bytes(&bytes).unwrap(), sig);
        assert_eq!(sig.to_hex().parse::<RecoverableSignature>().unwrap(), sig);
    }

    #[test]
    fn test_bad_wire_input_rejected() {
        assert_eq!(
            RecoverableSignature::from_bytes(&[0u8; 64]),
            Err(SignatureError::InvalidLength(64))
        );
        assert_eq!(
            "0xnothex".parse::<RecoverableSignature>(),
            Err(SignatureError::InvalidHex)
        );
    }
}
