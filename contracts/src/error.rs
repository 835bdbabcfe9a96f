//! # Contract Errors
//!
//! One taxonomy for every entry point of the ledger. Each variant aborts the
//! whole requested operation; by the time a caller sees one, the ledger,
//! the event log and the metadata locator are exactly as they were before
//! the call.

use assent_protocol::types::{Address, Amount, TokenId};
use thiserror::Error;

/// Errors returned by [`MultiToken`](crate::MultiToken) entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// The mint recipient is the reserved zero address.
    #[error("invalid recipient: mint to the zero address")]
    InvalidRecipient,

    /// The burn subject is the reserved zero address.
    #[error("invalid account: burn from the zero address")]
    InvalidAccount,

    /// The signature does not recover to the recipient over the exact
    /// mint parameters.
    #[error("invalid mint signature")]
    InvalidMintSignature,

    /// The programmable recipient declined the tokens, failed, or exposes no
    /// receiver callback.
    #[error("receiver rejected tokens")]
    ReceiverRejected,

    /// A debit would take a balance below zero.
    #[error(
        "insufficient balance: account {account} holds {balance} of token {token_id}, requested {requested}"
    )]
    InsufficientBalance {
        account: Address,
        token_id: TokenId,
        balance: Amount,
        requested: Amount,
    },

    /// Batch sequences disagree in length.
    #[error("length mismatch: {ids} ids, {amounts} amounts")]
    LengthMismatch { ids: usize, amounts: usize },

    /// A batch balance query pairs a different number of accounts and ids.
    #[error("length mismatch: {accounts} accounts, {ids} ids")]
    QueryLengthMismatch { accounts: usize, ids: usize },

    /// A credit would exceed the 256-bit balance range.
    #[error("balance overflow: account {account}, token {token_id}")]
    BalanceOverflow { account: Address, token_id: TokenId },
}

impl ContractError {
    /// Stable, machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ContractError::InvalidRecipient => "InvalidRecipient",
            ContractError::InvalidAccount => "InvalidAccount",
            ContractError::InvalidMintSignature => "InvalidMintSignature",
            ContractError::ReceiverRejected => "ReceiverRejected",
            ContractError::InsufficientBalance { .. } => "InsufficientBalance",
            ContractError::LengthMismatch { .. } | ContractError::QueryLengthMismatch { .. } => {
                "LengthMismatch"
            }
            ContractError::BalanceOverflow { .. } => "BalanceOverflow",
        }
    }
}

/// Fails with [`ContractError::LengthMismatch`] unless both sequences have
/// the same length.
pub(crate) fn ensure_same_length<A, B>(ids: &[A], amounts: &[B]) -> Result<(), ContractError> {
    if ids.len() != amounts.len() {
        return Err(ContractError::LengthMismatch {
            ids: ids.len(),
            amounts: amounts.len(),
        });
    }
    Ok(())
}
