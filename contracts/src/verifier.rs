//! # Mint Approval Verification
//!
//! An externally-controlled account consents to a mint by signing the
//! digest of the exact mint parameters. The digest is Keccak-256 over a
//! packed encoding:
//!
//! ```text
//! single: keccak256(MINT_SINGLE_DOMAIN) || ledger || to || be32(id)  || be32(amount)
//! batch:  keccak256(MINT_BATCH_DOMAIN)  || ledger || to || be32(ids...) || be32(amounts...)
//! ```
//!
//! - The domain word keeps single and batch approvals (and anything else
//!   the account might sign) from being interchangeable.
//! - The ledger's own address binds an approval to one ledger.
//! - There is no nonce and no expiry: the digest is a pure function of the
//!   parameters.
//!
//! The signer is recovered after wrapping the digest as a personal message,
//! so approvals can be produced by any wallet's `personal_sign`.
//!
//! Recovery itself sits behind [`SignerRecovery`]; the default is
//! secp256k1 ([`Secp256k1Recovery`]).

use std::fmt;
use std::sync::Arc;

use assent_protocol::config::{MINT_BATCH_DOMAIN, MINT_SINGLE_DOMAIN};
use assent_protocol::crypto::{
    keccak256, keccak256_multi, recover_signer, AccountKeypair, RecoverableSignature,
    SignatureError,
};
use assent_protocol::types::{to_be_word, Address, Amount, TokenId};
use thiserror::Error;

use crate::error::{ensure_same_length, ContractError};

/// A 32-byte approval digest.
pub type Digest = [u8; 32];

/// Recovers the account behind a signature over a digest.
///
/// Implementations must not panic on malformed input; `None` means
/// "no valid signer".
pub trait SignerRecovery: Send + Sync {
    fn recover(&self, digest: &Digest, signature: &RecoverableSignature) -> Option<Address>;
}

/// secp256k1 recovery over the personal-message wrapping of the digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Recovery;

impl SignerRecovery for Secp256k1Recovery {
    fn recover(&self, digest: &Digest, signature: &RecoverableSignature) -> Option<Address> {
        recover_signer(digest, signature)
    }
}

/// Computes approval digests for one ledger and checks signatures over them.
#[derive(Clone)]
pub struct SignatureVerifier {
    ledger: Address,
    recovery: Arc<dyn SignerRecovery>,
}

impl SignatureVerifier {
    /// A verifier bound to `ledger`, using secp256k1 recovery.
    pub fn new(ledger: Address) -> Self {
        Self::with_recovery(ledger, Arc::new(Secp256k1Recovery))
    }

    /// A verifier with a custom recovery primitive.
    pub fn with_recovery(ledger: Address, recovery: Arc<dyn SignerRecovery>) -> Self {
        Self { ledger, recovery }
    }

    /// The ledger identity mixed into every digest.
    pub fn ledger_address(&self) -> Address {
        self.ledger
    }

    pub fn digest_single(&self, to: &Address, token_id: &TokenId, amount: &Amount) -> Digest {
        single_digest(&self.ledger, to, token_id, amount)
    }

    pub fn digest_batch(
        &self,
        to: &Address,
        token_ids: &[TokenId],
        amounts: &[Amount],
    ) -> Result<Digest, ContractError> {
        batch_digest(&self.ledger, to, token_ids, amounts)
    }

    pub fn recover_signer(
        &self,
        digest: &Digest,
        signature: &RecoverableSignature,
    ) -> Option<Address> {
        self.recovery.recover(digest, signature)
    }

    /// `true` iff `expected` is non-zero and the signature recovers to it.
    pub fn verify_mint_approval(
        &self,
        expected: &Address,
        digest: &Digest,
        signature: &RecoverableSignature,
    ) -> bool {
        if expected.is_zero() {
            return false;
        }
        self.recover_signer(digest, signature).as_ref() == Some(expected)
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

fn domain_word(tag: &str) -> [u8; 32] {
    keccak256(tag.as_bytes())
}

/// Digest of a single-token approval against `ledger`.
pub fn single_digest(ledger: &Address, to: &Address, token_id: &TokenId, amount: &Amount) -> Digest {
    let domain = domain_word(MINT_SINGLE_DOMAIN);
    let id_word = to_be_word(token_id);
    let amount_word = to_be_word(amount);
    keccak256_multi(&[
        domain.as_slice(),
        ledger.as_bytes().as_slice(),
        to.as_bytes().as_slice(),
        id_word.as_slice(),
        amount_word.as_slice(),
    ])
}

/// Digest of a batch approval against `ledger`. Ids come first, then
/// amounts, each as a 32-byte word.
pub fn batch_digest(
    ledger: &Address,
    to: &Address,
    token_ids: &[TokenId],
    amounts: &[Amount],
) -> Result<Digest, ContractError> {
    ensure_same_length(token_ids, amounts)?;

    let domain = domain_word(MINT_BATCH_DOMAIN);
    let words: Vec<[u8; 32]> = token_ids
        .iter()
        .chain(amounts.iter())
        .map(to_be_word)
        .collect();

    let mut parts: Vec<&[u8]> = Vec::with_capacity(3 + words.len());
    parts.push(domain.as_slice());
    parts.push(ledger.as_bytes().as_slice());
    parts.push(to.as_bytes().as_slice());
    parts.extend(words.iter().map(|w| w.as_slice()));
    Ok(keccak256_multi(&parts))
}

/// Errors while producing an approval off-chain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// The parameters a recipient consents to. Never stored; only its digest
/// and signature travel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintApproval {
    Single {
        to: Address,
        token_id: TokenId,
        amount: Amount,
    },
    Batch {
        to: Address,
        token_ids: Vec<TokenId>,
        amounts: Vec<Amount>,
    },
}

impl MintApproval {
    pub fn single(to: Address, token_id: TokenId, amount: Amount) -> Self {
        MintApproval::Single {
            to,
            token_id,
            amount,
        }
    }

    pub fn batch(to: Address, token_ids: Vec<TokenId>, amounts: Vec<Amount>) -> Self {
        MintApproval::Batch {
            to,
            token_ids,
            amounts,
        }
    }

    /// The recipient (and required signer).
    pub fn recipient(&self) -> Address {
        match self {
            MintApproval::Single { to, .. } | MintApproval::Batch { to, .. } => *to,
        }
    }

    /// The digest this approval signs when presented to `ledger`.
    pub fn digest(&self, ledger: &Address) -> Result<Digest, ContractError> {
        match self {
            MintApproval::Single {
                to,
                token_id,
                amount,
            } => Ok(single_digest(ledger, to, token_id, amount)),
            MintApproval::Batch {
                to,
                token_ids,
                amounts,
            } => batch_digest(ledger, to, token_ids, amounts),
        }
    }

    /// Signs the approval for `ledger` with `keypair`. Only a signature by
    /// the recipient's own key will be accepted by the ledger.
    pub fn sign(
        &self,
        ledger: &Address,
        keypair: &AccountKeypair,
    ) -> Result<RecoverableSignature, ApprovalError> {
        let digest = self.digest(ledger)?;
        Ok(keypair.sign_digest(&digest)?)
    }
}
