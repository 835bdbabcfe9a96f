//! # Mint Authorization
//!
//! New balances come into existence only with the recipient's consent, in
//! one of two forms:
//!
//! - **Externally-controlled recipient**: the recipient's own signature over
//!   the approval digest of the exact parameters.
//! - **Programmable recipient**: the recipient's callback returns the
//!   acceptance marker.
//!
//! Each path is `Start → {Credited | Rejected}`. Zero recipients are refused
//! before anything else is looked at. On the contract path the credit is
//! applied strictly after the callback returns, so a receiver that calls
//! back into the ledger never sees tokens that are not yet its own.

use assent_protocol::crypto::RecoverableSignature;
use assent_protocol::types::{Address, Amount, TokenId};
use tracing::{debug, warn};

use crate::error::{ensure_same_length, ContractError};
use crate::events::LedgerEvent;
use crate::multi_token::MultiToken;
use crate::receiver::{AcceptanceResult, ReceiverAcceptance};

impl MultiToken {
    /// Mints `amount` of `token_id` to an externally-controlled `recipient`
    /// whose `signature` approves exactly these parameters on this ledger.
    ///
    /// `data` is accepted for call-shape parity with the contract path and
    /// is not interpreted.
    pub fn mint_to_eoa(
        &mut self,
        caller: Address,
        recipient: Address,
        token_id: TokenId,
        amount: Amount,
        signature: &RecoverableSignature,
        data: &[u8],
    ) -> Result<(), ContractError> {
        let _ = data;
        if recipient.is_zero() {
            warn!(%caller, "mint to zero address refused");
            return Err(ContractError::InvalidRecipient);
        }

        let digest = self.verifier.digest_single(&recipient, &token_id, &amount);
        if !self
            .verifier
            .verify_mint_approval(&recipient, &digest, signature)
        {
            warn!(%caller, %recipient, %token_id, "mint approval signature rejected");
            return Err(ContractError::InvalidMintSignature);
        }

        self.transact(|token| {
            token.ledger.credit(&recipient, &token_id, amount)?;
            token.events.emit(LedgerEvent::MintSingle {
                operator: caller,
                to: recipient,
                id: token_id,
                amount,
            });
            Ok(())
        })?;

        debug!(%caller, %recipient, %token_id, %amount, "minted to signer");
        Ok(())
    }

    /// Mints `amount` of `token_id` to a programmable `recipient` that
    /// accepts it through its receiver callback.
    pub fn mint_to_contract(
        &mut self,
        caller: Address,
        recipient: Address,
        token_id: TokenId,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), ContractError> {
        if recipient.is_zero() {
            warn!(%caller, "mint to zero address refused");
            return Err(ContractError::InvalidRecipient);
        }

        self.transact(|token| {
            let result = ReceiverAcceptance::request_acceptance(
                token, recipient, caller, token_id, amount, data,
            );
            if let AcceptanceResult::Rejected(reason) = result {
                warn!(%caller, %recipient, %token_id, %reason, "receiver rejected mint");
                return Err(ContractError::ReceiverRejected);
            }

            token.ledger.credit(&recipient, &token_id, amount)?;
            token.events.emit(LedgerEvent::MintSingle {
                operator: caller,
                to: recipient,
                id: token_id,
                amount,
            });
            Ok(())
        })?;

        debug!(%caller, %recipient, %token_id, %amount, "minted to receiver");
        Ok(())
    }

    /// Batch form of [`mint_to_eoa`](Self::mint_to_eoa). The signature must
    /// cover the batch digest of `token_ids` and `amounts` in order.
    pub fn mint_batch_to_eoa(
        &mut self,
        caller: Address,
        recipient: Address,
        token_ids: &[TokenId],
        amounts: &[Amount],
        signature: &RecoverableSignature,
        data: &[u8],
    ) -> Result<(), ContractError> {
        let _ = data;
        if recipient.is_zero() {
            warn!(%caller, "batch mint to zero address refused");
            return Err(ContractError::InvalidRecipient);
        }

        let digest = self.verifier.digest_batch(&recipient, token_ids, amounts)?;
        if !self
            .verifier
            .verify_mint_approval(&recipient, &digest, signature)
        {
            warn!(%caller, %recipient, pairs = token_ids.len(), "batch approval signature rejected");
            return Err(ContractError::InvalidMintSignature);
        }

        self.transact(|token| {
            token.ledger.credit_batch(&recipient, token_ids, amounts)?;
            token.events.emit(LedgerEvent::MintBatch {
                operator: caller,
                to: recipient,
                ids: token_ids.to_vec(),
                amounts: amounts.to_vec(),
            });
            Ok(())
        })?;

        debug!(%caller, %recipient, pairs = token_ids.len(), "batch minted to signer");
        Ok(())
    }

    /// Batch form of [`mint_to_contract`](Self::mint_to_contract), using the
    /// batch receiver callback.
    pub fn mint_batch_to_contract(
        &mut self,
        caller: Address,
        recipient: Address,
        token_ids: &[TokenId],
        amounts: &[Amount],
        data: &[u8],
    ) -> Result<(), ContractError> {
        if recipient.is_zero() {
            warn!(%caller, "batch mint to zero address refused");
            return Err(ContractError::InvalidRecipient);
        }
        ensure_same_length(token_ids, amounts)?;

        self.transact(|token| {
            let result = ReceiverAcceptance::request_batch_acceptance(
                token, recipient, caller, token_ids, amounts, data,
            );
            if let AcceptanceResult::Rejected(reason) = result {
                warn!(%caller, %recipient, %reason, "receiver rejected batch mint");
                return Err(ContractError::ReceiverRejected);
            }

            token.ledger.credit_batch(&recipient, token_ids, amounts)?;
            token.events.emit(LedgerEvent::MintBatch {
                operator: caller,
                to: recipient,
                ids: token_ids.to_vec(),
                amounts: amounts.to_vec(),
            });
            Ok(())
        })?;

        debug!(%caller, %recipient, pairs = token_ids.len(), "batch minted to receiver");
        Ok(())
    }
}
