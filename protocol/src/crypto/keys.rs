//! # Key Management
//!
//! secp256k1 keypairs for externally-controlled accounts.
//!
//! The ledger itself never holds a private key: it only recovers signers.
//! Keys exist in this crate for the off-chain side of the protocol (wallet
//! tooling, the node's `sign-approval` command, tests and benchmarks), and
//! so that address derivation lives next to the key type it derives from.
//!
//! ## Security considerations
//!
//! - Secret scalars are zeroized on drop (thanks, RustCrypto).
//! - Key generation uses `OsRng`.
//! - Key bytes are never logged, and `Debug` prints only the address.

use std::fmt;

use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use thiserror::Error;

use super::hash::{keccak256, personal_message_hash};
use super::signatures::{RecoverableSignature, SignatureError};
use crate::config::SECRET_KEY_LENGTH;
use crate::types::Address;

/// Errors that can occur during key operations.
///
/// Deliberately vague about *why* a secret was rejected.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid secret key hex")]
    InvalidHex,
}

/// An account keypair wrapping a secp256k1 signing key.
///
/// `AccountKeypair` intentionally does NOT implement `Serialize`. Exporting
/// a secret should be an explicit call to [`secret_key_bytes`](Self::secret_key_bytes).
///
/// # Examples
///
/// ```
/// use assent_protocol::crypto::{keccak256, recover_signer, AccountKeypair};
///
/// let kp = AccountKeypair::generate();
/// let digest = keccak256(b"mint 100 of token 7");
/// let sig = kp.sign_digest(&digest).unwrap();
/// assert_eq!(recover_signer(&digest, &sig), Some(kp.address()));
/// ```
pub struct AccountKeypair {
    signing_key: SigningKey,
}

impl AccountKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Reconstructs a keypair from a 32-byte big-endian secret scalar.
    ///
    /// Fails for zero, for values at or above the curve order, and for any
    /// input that isn't exactly 32 bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidSecretKey);
        }
        let signing_key = SigningKey::from_slice(bytes).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self { signing_key })
    }

    /// Parses a hex-encoded secret, with or without `0x`.
    pub fn from_secret_hex(s: &str) -> Result<Self, KeyError> {
        let s = s.trim();
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| KeyError::InvalidHex)?;
        Self::from_secret_bytes(&bytes)
    }

    /// Exports the secret scalar. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        let mut out = [0u8; SECRET_KEY_LENGTH];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    /// The account this keypair controls.
    pub fn address(&self) -> Address {
        address_from_verifying_key(self.signing_key.verifying_key())
    }

    /// Uncompressed SEC1 public key (65 bytes, leading `0x04`).
    pub fn public_key_uncompressed(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .as_affine()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    /// Signs a 32-byte digest the way `personal_sign` does: the digest is
    /// wrapped with the personal-message prefix and hashed before signing.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, SignatureError> {
        let prehash = personal_message_hash(digest);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&prehash)
            .map_err(|_| SignatureError::SigningFailed)?;
        Ok(RecoverableSignature::from_parts(&signature, recovery_id))
    }
}

impl fmt::Debug for AccountKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountKeypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Derives the account address of a verifying key: the trailing 20 bytes of
/// Keccak-256 over the uncompressed point without its `0x04` tag.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let encoded = key.as_affine().to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_hash(&hash)
}
