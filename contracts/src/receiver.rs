//! # Receiver Acceptance
//!
//! A programmable account agrees to receive a mint by answering a
//! synchronous callback with a fixed 4-byte acceptance marker. The marker is
//! the selector of the callback's canonical signature, so a receiver that
//! returns something generic (zero bytes, the wrong selector) cannot accept
//! by accident.
//!
//! The callback is the only place where control leaves the ledger's trust
//! boundary. The receiver gets `&mut MultiToken` and may call back into any
//! entry point before it answers. The ledger stays sound because:
//!
//! 1. the credit for the pending mint is applied only after the callback
//!    returns `Accepted` (a reentrant read sees the pre-mint balance), and
//! 2. the whole request runs inside a checkpoint, so a rejection also rolls
//!    back anything the receiver did while it had control.
//!
//! Anything other than the exact marker is a rejection: a wrong marker, an
//! `Err`, a panic, or no registered callback at all.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use assent_protocol::config::{MINT_BATCH_CALLBACK, MINT_SINGLE_CALLBACK, SELECTOR_LENGTH};
use assent_protocol::crypto::selector;
use assent_protocol::types::{Address, Amount, TokenId};
use thiserror::Error;

use crate::error::ContractError;
use crate::multi_token::MultiToken;

/// Value a receiver returns to accept a mint.
pub type AcceptanceMarker = [u8; SELECTOR_LENGTH];

/// Marker that accepts a single-token mint.
pub fn mint_accepted_marker() -> AcceptanceMarker {
    selector(MINT_SINGLE_CALLBACK)
}

/// Marker that accepts a batch mint.
pub fn mint_batch_accepted_marker() -> AcceptanceMarker {
    selector(MINT_BATCH_CALLBACK)
}

/// How a receiver callback can fail.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// The receiver does not expose this callback.
    #[error("callback not implemented")]
    Unsupported,

    /// The receiver refused with a reason.
    #[error("receiver reverted: {0}")]
    Reverted(String),

    /// A reentrant call made by the receiver failed and it propagated the error.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// The callback surface of a programmable account.
///
/// Both methods default to [`ReceiverError::Unsupported`], which the ledger
/// treats as "no callback": a receiver that only implements the single-mint
/// callback rejects every batch mint.
pub trait TokenReceiver: Send + Sync {
    /// Called before `amount` of `token_id` is credited to this receiver.
    /// `operator` is the caller of the mint.
    fn on_mint_received(
        &self,
        token: &mut MultiToken,
        operator: Address,
        token_id: TokenId,
        amount: Amount,
        data: &[u8],
    ) -> Result<AcceptanceMarker, ReceiverError> {
        let _ = (token, operator, token_id, amount, data);
        Err(ReceiverError::Unsupported)
    }

    /// Called before a batch is credited to this receiver.
    fn on_mint_batch_received(
        &self,
        token: &mut MultiToken,
        operator: Address,
        token_ids: &[TokenId],
        amounts: &[Amount],
        data: &[u8],
    ) -> Result<AcceptanceMarker, ReceiverError> {
        let _ = (token, operator, token_ids, amounts, data);
        Err(ReceiverError::Unsupported)
    }
}

/// Why a receiver did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No callback is registered for the recipient.
    NoCallback,
    /// The callback returned something other than the acceptance marker.
    WrongMarker(AcceptanceMarker),
    /// The callback returned an error.
    Failed(String),
    /// The callback panicked.
    Panicked,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoCallback => write!(f, "no receiver callback"),
            Rejection::WrongMarker(m) => write!(f, "wrong acceptance marker 0x{}", hex::encode(m)),
            Rejection::Failed(reason) => write!(f, "callback failed: {}", reason),
            Rejection::Panicked => write!(f, "callback panicked"),
        }
    }
}

/// Outcome of asking a programmable recipient to accept a mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptanceResult {
    Accepted,
    Rejected(Rejection),
}

impl AcceptanceResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AcceptanceResult::Accepted)
    }
}

/// Programmable accounts known to the ledger, by address.
#[derive(Clone, Default)]
pub struct ReceiverRegistry {
    receivers: HashMap<Address, Arc<dyn TokenReceiver>>,
}

impl ReceiverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `receiver` as the code behind `address`, returning the
    /// previous registration.
    pub fn register(
        &mut self,
        address: Address,
        receiver: Arc<dyn TokenReceiver>,
    ) -> Option<Arc<dyn TokenReceiver>> {
        self.receivers.insert(address, receiver)
    }

    pub fn unregister(&mut self, address: &Address) -> Option<Arc<dyn TokenReceiver>> {
        self.receivers.remove(address)
    }

    pub fn get(&self, address: &Address) -> Option<Arc<dyn TokenReceiver>> {
        self.receivers.get(address).cloned()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.receivers.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// Registered addresses, sorted.
    pub fn addresses(&self) -> Vec<Address> {
        let mut out: Vec<_> = self.receivers.keys().copied().collect();
        out.sort();
        out
    }
}

impl fmt::Debug for ReceiverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiverRegistry")
            .field("addresses", &self.addresses())
            .finish()
    }
}

/// Runs receiver callbacks and interprets their answers.
pub struct ReceiverAcceptance;

impl ReceiverAcceptance {
    /// Asks `recipient` to accept `amount` of `token_id` minted by `caller`.
    pub fn request_acceptance(
        token: &mut MultiToken,
        recipient: Address,
        caller: Address,
        token_id: TokenId,
        amount: Amount,
        data: &[u8],
    ) -> AcceptanceResult {
        let Some(receiver) = token.receiver(&recipient) else {
            return AcceptanceResult::Rejected(Rejection::NoCallback);
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            receiver.on_mint_received(token, caller, token_id, amount, data)
        }));
        interpret(outcome, mint_accepted_marker())
    }

    /// Asks `recipient` to accept a batch minted by `caller`.
    pub fn request_batch_acceptance(
        token: &mut MultiToken,
        recipient: Address,
        caller: Address,
        token_ids: &[TokenId],
        amounts: &[Amount],
        data: &[u8],
    ) -> AcceptanceResult {
        let Some(receiver) = token.receiver(&recipient) else {
            return AcceptanceResult::Rejected(Rejection::NoCallback);
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            receiver.on_mint_batch_received(token, caller, token_ids, amounts, data)
        }));
        interpret(outcome, mint_batch_accepted_marker())
    }
}

fn interpret(
    outcome: std::thread::Result<Result<AcceptanceMarker, ReceiverError>>,
    expected: AcceptanceMarker,
) -> AcceptanceResult {
    match outcome {
        Ok(Ok(marker)) if marker == expected => AcceptanceResult::Accepted,
        Ok(Ok(marker)) => AcceptanceResult::Rejected(Rejection::WrongMarker(marker)),
        Ok(Err(ReceiverError::Unsupported)) => AcceptanceResult::Rejected(Rejection::NoCallback),
        Ok(Err(e)) => AcceptanceResult::Rejected(Rejection::Failed(e.to_string())),
        Err(_) => AcceptanceResult::Rejected(Rejection::Panicked),
    }
}
