//! # Ledger Events
//!
//! Observable side effects of successful entry points. Events are appended
//! inside the same transaction as the balance change they describe, so a
//! reverted request leaves no event behind.

use assent_protocol::types::{Address, Amount, TokenId};
use serde::{Deserialize, Serialize};

/// An event emitted by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A single token type was minted.
    MintSingle {
        operator: Address,
        to: Address,
        id: TokenId,
        amount: Amount,
    },
    /// Several token types were minted to one recipient in one request.
    MintBatch {
        operator: Address,
        to: Address,
        ids: Vec<TokenId>,
        amounts: Vec<Amount>,
    },
    /// A single token type was burned.
    BurnSingle {
        operator: Address,
        from: Address,
        id: TokenId,
        amount: Amount,
    },
    /// Several token types were burned from one account in one request.
    BurnBatch {
        operator: Address,
        from: Address,
        ids: Vec<TokenId>,
        amounts: Vec<Amount>,
    },
    /// The metadata base URI changed.
    BaseUriUpdated { operator: Address, uri: String },
}

impl LedgerEvent {
    /// Short name used in logs and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::MintSingle { .. } => "MintSingle",
            LedgerEvent::MintBatch { .. } => "MintBatch",
            LedgerEvent::BurnSingle { .. } => "BurnSingle",
            LedgerEvent::BurnBatch { .. } => "BurnBatch",
            LedgerEvent::BaseUriUpdated { .. } => "BaseUriUpdated",
        }
    }

    /// The account whose balances the event changed, if any.
    pub fn subject(&self) -> Option<Address> {
        match self {
            LedgerEvent::MintSingle { to, .. } | LedgerEvent::MintBatch { to, .. } => Some(*to),
            LedgerEvent::BurnSingle { from, .. } | LedgerEvent::BurnBatch { from, .. } => {
                Some(*from)
            }
            LedgerEvent::BaseUriUpdated { .. } => None,
        }
    }
}

/// Append-only event log with truncation for rollback.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<LedgerEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: LedgerEvent) {
        tracing::trace!(event = event.name(), "event emitted");
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn as_slice(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Drops every event at or after `len`.
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    /// Removes and returns all events.
    pub fn drain(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mint(n: u64) -> LedgerEvent {
        LedgerEvent::MintSingle {
            operator: Address::new([1; 20]),
            to: Address::new([2; 20]),
            id: TokenId::from(n),
            amount: Amount::from(10u64),
        }
    }

    #[test]
    fn truncate_drops_tail() {
        let mut log = EventLog::new();
        log.emit(mint(1));
        log.emit(mint(2));
        log.emit(mint(3));
        log.truncate(1);
        assert_eq!(log.as_slice(), &[mint(1)]);
    }

    #[test]
    fn drain_empties_log() {
        let mut log = EventLog::new();
        log.emit(mint(1));
        assert_eq!(log.drain(), vec![mint(1)]);
        assert!(log.is_empty());
    }

    #[test]
    fn subject_of_mint_and_burn() {
        assert_eq!(mint(1).subject(), Some(Address::new([2; 20])));
        let burn = LedgerEvent::BurnBatch {
            operator: Address::new([1; 20]),
            from: Address::new([3; 20]),
            ids: vec![],
            amounts: vec![],
        };
        assert_eq!(burn.subject(), Some(Address::new([3; 20])));
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(mint(1)).unwrap();
        assert_eq!(json["type"], "mint_single");
        assert_eq!(json["to"], format!("0x{}", "02".repeat(20)));
    }
}
