//! # Burn Accounting
//!
//! Burning destroys tokens by debiting the holder. A burn never takes a
//! balance below zero, and a batch burn debits every pair or none.

use assent_protocol::types::{Address, Amount, TokenId};
use tracing::{debug, warn};

use crate::error::{ensure_same_length, ContractError};
use crate::events::LedgerEvent;
use crate::multi_token::MultiToken;

impl MultiToken {
    /// Burns `amount` of `token_id` held by `account`.
    pub fn burn(
        &mut self,
        caller: Address,
        account: Address,
        token_id: TokenId,
        amount: Amount,
    ) -> Result<(), ContractError> {
        if account.is_zero() {
            warn!(%caller, "burn from zero address refused");
            return Err(ContractError::InvalidAccount);
        }

        self.transact(|token| {
            token.ledger.debit(&account, &token_id, amount)?;
            token.events.emit(LedgerEvent::BurnSingle {
                operator: caller,
                from: account,
                id: token_id,
                amount,
            });
            Ok(())
        })
        .map_err(|e| {
            warn!(%caller, %account, %token_id, error = %e, "burn failed");
            e
        })?;

        debug!(%caller, %account, %token_id, %amount, "burned");
        Ok(())
    }

    /// Burns `amounts[i]` of `token_ids[i]` held by `account`, all or nothing.
    /// Repeated ids are debited cumulatively.
    pub fn burn_batch(
        &mut self,
        caller: Address,
        account: Address,
        token_ids: &[TokenId],
        amounts: &[Amount],
    ) -> Result<(), ContractError> {
        if account.is_zero() {
            warn!(%caller, "batch burn from zero address refused");
            return Err(ContractError::InvalidAccount);
        }
        ensure_same_length(token_ids, amounts)?;

        self.transact(|token| {
            token.ledger.debit_batch(&account, token_ids, amounts)?;
            token.events.emit(LedgerEvent::BurnBatch {
                operator: caller,
                from: account,
                ids: token_ids.to_vec(),
                amounts: amounts.to_vec(),
            });
            Ok(())
        })
        .map_err(|e| {
            warn!(%caller, %account, error = %e, "batch burn failed");
            e
        })?;

        debug!(%caller, %account, pairs = token_ids.len(), "batch burned");
        Ok(())
    }
}
