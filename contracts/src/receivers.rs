//! # Built-in Receivers
//!
//! Two stock programmable accounts:
//!
//! - [`TokenVault`] accepts everything. The node registers one per
//!   `--vault` address so custodial accounts can be minted to without a
//!   signature.
//! - [`SelectiveReceiver`] accepts everything except a configured set of
//!   token ids. `SelectiveReceiver::rejecting_zero()` is the standard
//!   mock recipient that refuses token id `0`.

use std::collections::BTreeSet;

use assent_protocol::types::{Address, Amount, TokenId};

use crate::multi_token::MultiToken;
use crate::receiver::{
    mint_accepted_marker, mint_batch_accepted_marker, AcceptanceMarker, ReceiverError,
    TokenReceiver,
};

/// Accepts every single and batch mint.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenVault;

impl TokenReceiver for TokenVault {
    fn on_mint_received(
        &self,
        _token: &mut MultiToken,
        _operator: Address,
        _token_id: TokenId,
        _amount: Amount,
        _data: &[u8],
    ) -> Result<AcceptanceMarker, ReceiverError> {
        Ok(mint_accepted_marker())
    }

    fn on_mint_batch_received(
        &self,
        _token: &mut MultiToken,
        _operator: Address,
        _token_ids: &[TokenId],
        _amounts: &[Amount],
        _data: &[u8],
    ) -> Result<AcceptanceMarker, ReceiverError> {
        Ok(mint_batch_accepted_marker())
    }
}

/// Accepts every token id except those in `rejected`. A batch containing any
/// rejected id is refused as a whole.
#[derive(Debug, Clone, Default)]
pub struct SelectiveReceiver {
    rejected: BTreeSet<TokenId>,
}

impl SelectiveReceiver {
    pub fn new(rejected: impl IntoIterator<Item = TokenId>) -> Self {
        Self {
            rejected: rejected.into_iter().collect(),
        }
    }

    /// The mock recipient that refuses token id `0`.
    pub fn rejecting_zero() -> Self {
        Self::new([TokenId::zero()])
    }

    pub fn rejects(&self, token_id: &TokenId) -> bool {
        self.rejected.contains(token_id)
    }
}

impl TokenReceiver for SelectiveReceiver {
    fn on_mint_received(
        &self,
        _token: &mut MultiToken,
        _operator: Address,
        token_id: TokenId,
        _amount: Amount,
        _data: &[u8],
    ) -> Result<AcceptanceMarker, ReceiverError> {
        if self.rejects(&token_id) {
            return Err(ReceiverError::Reverted(format!(
                "token id {} not accepted",
                token_id
            )));
        }
        Ok(mint_accepted_marker())
    }

    fn on_mint_batch_received(
        &self,
        _token: &mut MultiToken,
        _operator: Address,
        token_ids: &[TokenId],
        _amounts: &[Amount],
        _data: &[u8],
    ) -> Result<AcceptanceMarker, ReceiverError> {
        if let Some(id) = token_ids.iter().find(|id| self.rejects(id)) {
            return Err(ReceiverError::Reverted(format!(
                "token id {} not accepted",
                id
            )));
        }
        Ok(mint_batch_accepted_marker())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejecting_zero_only_rejects_zero() {
        let r = SelectiveReceiver::rejecting_zero();
        assert!(r.rejects(&TokenId::zero()));
        assert!(!r.rejects(&TokenId::from(1u64)));
    }

    #[test]
    fn vault_returns_both_markers() {
        let mut token = MultiToken::new(Address::new([0x1E; 20]), "uri");
        let vault = TokenVault;
        let op = Address::new([1; 20]);
        assert_eq!(
            vault
                .on_mint_received(&mut token, op, TokenId::zero(), Amount::one(), &[])
                .unwrap(),
            mint_accepted_marker()
        );
        assert_eq!(
            vault
                .on_mint_batch_received(&mut token, op, &[], &[], &[])
                .unwrap(),
            mint_batch_accepted_marker()
        );
    }

    #[test]
    fn selective_batch_rejects_if_any_id_rejected() {
        let mut token = MultiToken::new(Address::new([0x1E; 20]), "uri");
        let r = SelectiveReceiver::new([TokenId::from(3u64)]);
        let op = Address::new([1; 20]);
        let ids = [TokenId::from(1u64), TokenId::from(3u64)];
        let amounts = [Amount::one(), Amount::one()];
        assert!(r
            .on_mint_batch_received(&mut token, op, &ids, &amounts, &[])
            .is_err());
    }
}
