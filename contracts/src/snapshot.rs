//! # Ledger Snapshots
//!
//! A JSON image of a ledger's persistent state: its address, base URI and
//! every non-zero balance. Receivers are not part of a snapshot; they are
//! registered by whoever restores it.

use assent_protocol::types::{Address, Amount, TokenId};
use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::multi_token::MultiToken;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub account: Address,
    pub token_id: TokenId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub ledger_address: Address,
    pub base_uri: String,
    pub balances: Vec<BalanceEntry>,
}

impl LedgerSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl MultiToken {
    /// Captures the committed state. Undrained events are not included.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            ledger_address: self.address(),
            base_uri: self.base_uri().to_string(),
            balances: self
                .balances()
                .into_iter()
                .map(|(account, token_id, amount)| BalanceEntry {
                    account,
                    token_id,
                    amount,
                })
                .collect(),
        }
    }

    /// Rebuilds a ledger from a snapshot. Entries for the same pair are
    /// summed; a sum beyond 256 bits is `BalanceOverflow`.
    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> Result<Self, ContractError> {
        let mut token = MultiToken::new(snapshot.ledger_address, snapshot.base_uri.clone());
        for entry in &snapshot.balances {
            token
                .ledger
                .credit(&entry.account, &entry.token_id, entry.amount)?;
        }
        Ok(token)
    }
}
