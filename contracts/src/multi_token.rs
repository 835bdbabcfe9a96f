//! # MultiToken
//!
//! The ledger facade. It owns the balance map, the receiver registry, the
//! metadata locator and the event log, and exposes every entry point:
//!
//! | Entry point | Module |
//! |---|---|
//! | `mint_to_eoa`, `mint_to_contract`, batch variants | [`mint`](crate::mint) |
//! | `burn`, `burn_batch` | [`burn`](crate::burn) |
//! | `balance_of`, `balance_of_batch`, `uri`, `set_base_uri` | here |
//!
//! ## Atomicity
//!
//! Every mutating entry point runs through [`MultiToken::transact`]. It opens
//! a ledger checkpoint, remembers the event log length, the base URI and the
//! receiver registry, and restores them if the operation fails. Reentrant calls made from a
//! receiver callback nest their own checkpoints inside the caller's, so a
//! rejection at the outer level erases them too.

use std::sync::Arc;

use assent_protocol::types::{Address, Amount, TokenId};
use tracing::debug;

use crate::error::ContractError;
use crate::events::{EventLog, LedgerEvent};
use crate::ledger::{BalanceLedger, LedgerCheckpoint};
use crate::metadata::MetadataStore;
use crate::receiver::{ReceiverRegistry, TokenReceiver};
use crate::verifier::SignatureVerifier;

/// A consent-gated multi-token ledger.
#[derive(Debug, Clone)]
pub struct MultiToken {
    pub(crate) verifier: SignatureVerifier,
    pub(crate) ledger: BalanceLedger,
    pub(crate) receivers: ReceiverRegistry,
    pub(crate) metadata: MetadataStore,
    pub(crate) events: EventLog,
}

struct Checkpoint {
    ledger: LedgerCheckpoint,
    events_len: usize,
    base_uri: String,
    receivers: ReceiverRegistry,
}

impl MultiToken {
    /// An empty ledger identified by `address`, verifying approvals with
    /// secp256k1 recovery.
    pub fn new(address: Address, base_uri: impl Into<String>) -> Self {
        Self::with_verifier(SignatureVerifier::new(address), base_uri)
    }

    /// An empty ledger with a custom verifier. The ledger's address is the
    /// verifier's.
    pub fn with_verifier(verifier: SignatureVerifier, base_uri: impl Into<String>) -> Self {
        Self {
            verifier,
            ledger: BalanceLedger::new(),
            receivers: ReceiverRegistry::new(),
            metadata: MetadataStore::new(base_uri),
            events: EventLog::new(),
        }
    }

    /// The identity bound into every approval digest.
    pub fn address(&self) -> Address {
        self.verifier.ledger_address()
    }

    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    // -- Receivers ----------------------------------------------------------

    /// Makes `address` a programmable account backed by `receiver`. Returns
    /// the previous registration, if any.
    pub fn register_receiver(
        &mut self,
        address: Address,
        receiver: Arc<dyn TokenReceiver>,
    ) -> Option<Arc<dyn TokenReceiver>> {
        debug!(%address, "receiver registered");
        self.receivers.register(address, receiver)
    }

    pub fn unregister_receiver(&mut self, address: &Address) -> Option<Arc<dyn TokenReceiver>> {
        self.receivers.unregister(address)
    }

    /// The callback registered for `address`.
    pub fn receiver(&self, address: &Address) -> Option<Arc<dyn TokenReceiver>> {
        self.receivers.get(address)
    }

    /// `true` if `address` has a registered callback.
    pub fn is_programmable(&self, address: &Address) -> bool {
        self.receivers.contains(address)
    }

    pub fn receiver_addresses(&self) -> Vec<Address> {
        self.receivers.addresses()
    }

    // -- Reads --------------------------------------------------------------

    pub fn balance_of(&self, account: &Address, token_id: &TokenId) -> Amount {
        self.ledger.balance_of(account, token_id)
    }

    /// Balances for `accounts[i], token_ids[i]` pairs.
    pub fn balance_of_batch(
        &self,
        accounts: &[Address],
        token_ids: &[TokenId],
    ) -> Result<Vec<Amount>, ContractError> {
        self.ledger.balance_of_batch(accounts, token_ids)
    }

    /// All non-zero balances, sorted by account then token id.
    pub fn balances(&self) -> Vec<(Address, TokenId, Amount)> {
        self.ledger.non_zero_entries()
    }

    // -- Metadata -----------------------------------------------------------

    pub fn base_uri(&self) -> &str {
        self.metadata.base_uri()
    }

    /// Metadata locator for `token_id`.
    pub fn uri(&self, token_id: &TokenId) -> String {
        self.metadata.uri(token_id)
    }

    /// Replaces the base URI and emits `BaseUriUpdated`.
    pub fn set_base_uri(
        &mut self,
        caller: Address,
        uri: impl Into<String>,
    ) -> Result<(), ContractError> {
        let uri = uri.into();
        self.transact(|token| {
            token.metadata.set_base_uri(uri.clone());
            token.events.emit(LedgerEvent::BaseUriUpdated {
                operator: caller,
                uri,
            });
            Ok(())
        })
    }

    // -- Events -------------------------------------------------------------

    /// Events emitted so far and not yet drained.
    pub fn events(&self) -> &[LedgerEvent] {
        self.events.as_slice()
    }

    /// Takes every committed event. While a request is still in flight
    /// (i.e. when called from a receiver callback) nothing is committed yet
    /// and this returns an empty list.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        if self.ledger.in_transaction() {
            return Vec::new();
        }
        self.events.drain()
    }

    /// `true` while an entry point is executing.
    pub fn in_transaction(&self) -> bool {
        self.ledger.in_transaction()
    }

    // -- Transactions -------------------------------------------------------

    /// Runs `op` atomically: on `Err`, balances, events, the base URI and
    /// receiver registrations are restored to what they were before the call.
    pub(crate) fn transact<T, F>(&mut self, op: F) -> Result<T, ContractError>
    where
        F: FnOnce(&mut Self) -> Result<T, ContractError>,
    {
        let checkpoint = self.checkpoint();
        match op(self) {
            Ok(value) => {
                self.ledger.commit(checkpoint.ledger);
                Ok(value)
            }
            Err(e) => {
                self.revert_to(checkpoint);
                Err(e)
            }
        }
    }

    fn checkpoint(&mut self) -> Checkpoint {
        Checkpoint {
            ledger: self.ledger.checkpoint(),
            events_len: self.events.len(),
            base_uri: self.metadata.base_uri().to_string(),
            receivers: self.receivers.clone(),
        }
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) {
        self.ledger.revert_to(checkpoint.ledger);
        self.events.truncate(checkpoint.events_len);
        self.metadata.set_base_uri(checkpoint.base_uri);
        self.receivers = checkpoint.receivers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receivers::TokenVault;

    fn token() -> MultiToken {
        MultiToken::new(Address::new([0x1E; 20]), "https://meta.example/{id}.json")
    }

    fn admin() -> Address {
        Address::new([0xAD; 20])
    }

    #[test]
    fn new_ledger_is_empty() {
        let t = token();
        assert_eq!(t.address(), Address::new([0x1E; 20]));
        assert!(t.events().is_empty());
        assert!(t.balances().is_empty());
        assert!(!t.in_transaction());
    }

    #[test]
    fn set_base_uri_emits_event() {
        let mut t = token();
        t.set_base_uri(admin(), "ipfs://x/{id}").unwrap();
        assert_eq!(t.base_uri(), "ipfs://x/{id}");
        assert_eq!(
            t.events(),
            &[LedgerEvent::BaseUriUpdated {
                operator: admin(),
                uri: "ipfs://x/{id}".into()
            }]
        );
    }

    #[test]
    fn failed_transaction_restores_everything() {
        let mut t = token();
        let holder = Address::new([0x11; 20]);
        let result: Result<(), ContractError> = t.transact(|t| {
            t.ledger.credit(&holder, &TokenId::one(), Amount::from(9u64))?;
            t.metadata.set_base_uri("changed");
            t.events.emit(LedgerEvent::BaseUriUpdated {
                operator: admin(),
                uri: "changed".into(),
            });
            Err(ContractError::ReceiverRejected)
        });
        assert_eq!(result, Err(ContractError::ReceiverRejected));
        assert_eq!(t.balance_of(&holder, &TokenId::one()), Amount::zero());
        assert_eq!(t.base_uri(), "https://meta.example/{id}.json");
        assert!(t.events().is_empty());
        assert!(!t.in_transaction());
    }

    #[test]
    fn nested_commit_is_undone_by_outer_revert() {
        let mut t = token();
        let holder = Address::new([0x11; 20]);
        let result: Result<(), ContractError> = t.transact(|t| {
            t.transact(|t| t.ledger.credit(&holder, &TokenId::one(), Amount::one()))?;
            assert_eq!(t.balance_of(&holder, &TokenId::one()), Amount::one());
            Err(ContractError::ReceiverRejected)
        });
        assert!(result.is_err());
        assert_eq!(t.balance_of(&holder, &TokenId::one()), Amount::zero());
    }

    #[test]
    fn drain_is_empty_inside_transaction() {
        let mut t = token();
        t.set_base_uri(admin(), "a").unwrap();
        let drained: Result<Vec<LedgerEvent>, ContractError> =
            t.transact(|t| Ok(t.drain_events()));
        assert!(drained.unwrap().is_empty());
        assert_eq!(t.drain_events().len(), 1);
        assert!(t.events().is_empty());
    }

    #[test]
    fn receiver_registration() {
        let mut t = token();
        let vault = Address::new([0x77; 20]);
        assert!(!t.is_programmable(&vault));
        t.register_receiver(vault, Arc::new(TokenVault));
        assert!(t.is_programmable(&vault));
        assert_eq!(t.receiver_addresses(), vec![vault]);
        assert!(t.unregister_receiver(&vault).is_some());
        assert!(t.receiver(&vault).is_none());
    }

    #[test]
    fn failed_transaction_restores_registrations() {
        let mut t = token();
        let kept = Address::new([0x77; 20]);
        let added = Address::new([0x99; 20]);
        t.register_receiver(kept, Arc::new(TokenVault));
        let result: Result<(), ContractError> = t.transact(|t| {
            t.register_receiver(added, Arc::new(TokenVault));
            t.unregister_receiver(&kept);
            Err(ContractError::ReceiverRejected)
        });
        assert!(result.is_err());
        assert!(t.is_programmable(&kept));
        assert!(!t.is_programmable(&added));
    }
}
