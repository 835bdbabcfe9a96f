//! # Balance Ledger
//!
//! The mapping `(account, token id) → balance`, and the only code in the
//! crate that writes to it.
//!
//! ## Rollback
//!
//! Every write made while a checkpoint is open records the previous value of
//! the slot in an undo journal. [`revert_to`](BalanceLedger::revert_to)
//! replays the journal backwards, which restores the map exactly (a slot
//! that did not exist before is removed again, not left at zero).
//! Checkpoints nest: a reentrant call opens its own checkpoint on top of the
//! caller's, and reverting the outer one also undoes whatever the inner one
//! committed.

use std::collections::HashMap;

use assent_protocol::types::{Address, Amount, TokenId};

use crate::error::{ensure_same_length, ContractError};

type Slot = (Address, TokenId);

#[derive(Debug, Clone, PartialEq, Eq)]
struct JournalEntry {
    slot: Slot,
    previous: Option<Amount>,
}

/// Opaque marker returned by [`BalanceLedger::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a checkpoint must be committed or reverted"]
pub struct LedgerCheckpoint {
    journal_len: usize,
    depth: usize,
}

/// Per-account, per-token balances with checkpoint/revert support.
#[derive(Debug, Clone, Default)]
pub struct BalanceLedger {
    balances: HashMap<Slot, Amount>,
    journal: Vec<JournalEntry>,
    depth: usize,
}

impl BalanceLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance; zero for pairs never seen before.
    pub fn balance_of(&self, account: &Address, token_id: &TokenId) -> Amount {
        self.balances
            .get(&(*account, *token_id))
            .copied()
            .unwrap_or_default()
    }

    /// Balances for `accounts[i], token_ids[i]` pairs.
    pub fn balance_of_batch(
        &self,
        accounts: &[Address],
        token_ids: &[TokenId],
    ) -> Result<Vec<Amount>, ContractError> {
        if accounts.len() != token_ids.len() {
            return Err(ContractError::QueryLengthMismatch {
                accounts: accounts.len(),
                ids: token_ids.len(),
            });
        }
        Ok(accounts
            .iter()
            .zip(token_ids)
            .map(|(account, id)| self.balance_of(account, id))
            .collect())
    }

    /// Increases a balance. Overflow is an error, never a wrap or clamp.
    pub fn credit(
        &mut self,
        account: &Address,
        token_id: &TokenId,
        amount: Amount,
    ) -> Result<(), ContractError> {
        let current = self.balance_of(account, token_id);
        let updated = current
            .checked_add(amount)
            .ok_or(ContractError::BalanceOverflow {
                account: *account,
                token_id: *token_id,
            })?;
        self.write((*account, *token_id), updated);
        Ok(())
    }

    /// Decreases a balance, failing with
    /// [`ContractError::InsufficientBalance`] if it holds less than `amount`.
    pub fn debit(
        &mut self,
        account: &Address,
        token_id: &TokenId,
        amount: Amount,
    ) -> Result<(), ContractError> {
        let current = self.balance_of(account, token_id);
        let updated = current
            .checked_sub(amount)
            .ok_or(ContractError::InsufficientBalance {
                account: *account,
                token_id: *token_id,
                balance: current,
                requested: amount,
            })?;
        self.write((*account, *token_id), updated);
        Ok(())
    }

    /// Debits every pair or none of them. Duplicate ids accumulate, so
    /// `[(7, 5), (7, 5)]` against a balance of 8 fails as a whole.
    pub fn debit_batch(
        &mut self,
        account: &Address,
        token_ids: &[TokenId],
        amounts: &[Amount],
    ) -> Result<(), ContractError> {
        ensure_same_length(token_ids, amounts)?;
        let checkpoint = self.checkpoint();
        for (id, amount) in token_ids.iter().zip(amounts) {
            if let Err(e) = self.debit(account, id, *amount) {
                self.revert_to(checkpoint);
                return Err(e);
            }
        }
        self.commit(checkpoint);
        Ok(())
    }

    /// Credits every pair or none of them.
    pub fn credit_batch(
        &mut self,
        account: &Address,
        token_ids: &[TokenId],
        amounts: &[Amount],
    ) -> Result<(), ContractError> {
        ensure_same_length(token_ids, amounts)?;
        let checkpoint = self.checkpoint();
        for (id, amount) in token_ids.iter().zip(amounts) {
            if let Err(e) = self.credit(account, id, *amount) {
                self.revert_to(checkpoint);
                return Err(e);
            }
        }
        self.commit(checkpoint);
        Ok(())
    }

    /// Opens a checkpoint. Must be closed with [`commit`](Self::commit) or
    /// [`revert_to`](Self::revert_to).
    pub fn checkpoint(&mut self) -> LedgerCheckpoint {
        let checkpoint = LedgerCheckpoint {
            journal_len: self.journal.len(),
            depth: self.depth,
        };
        self.depth += 1;
        checkpoint
    }

    /// Keeps every write made since `checkpoint`. Once the outermost
    /// checkpoint commits, the journal is discarded.
    pub fn commit(&mut self, checkpoint: LedgerCheckpoint) {
        self.depth = checkpoint.depth;
        if self.depth == 0 {
            self.journal.clear();
        }
    }

    /// Undoes every write made since `checkpoint`, including writes of
    /// nested checkpoints that were committed or left open.
    pub fn revert_to(&mut self, checkpoint: LedgerCheckpoint) {
        while self.journal.len() > checkpoint.journal_len {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            match entry.previous {
                Some(amount) => {
                    self.balances.insert(entry.slot, amount);
                }
                None => {
                    self.balances.remove(&entry.slot);
                }
            }
        }
        self.depth = checkpoint.depth;
        if self.depth == 0 {
            self.journal.clear();
        }
    }

    /// `true` while at least one checkpoint is open.
    pub fn in_transaction(&self) -> bool {
        self.depth > 0
    }

    /// Number of `(account, token)` slots ever written.
    pub fn slot_count(&self) -> usize {
        self.balances.len()
    }

    /// All slots with a non-zero balance, sorted by account then token id.
    pub fn non_zero_entries(&self) -> Vec<(Address, TokenId, Amount)> {
        let mut entries: Vec<_> = self
            .balances
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|((account, id), amount)| (*account, *id, *amount))
            .collect();
        entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        entries
    }

    /// Content equality of the balance map, ignoring journal state.
    pub fn same_balances(&self, other: &BalanceLedger) -> bool {
        self.balances == other.balances
    }

    fn write(&mut self, slot: Slot, amount: Amount) {
        let previous = self.balances.insert(slot, amount);
        if self.depth > 0 {
            self.journal.push(JournalEntry { slot, previous });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::new([0xA1; 20])
    }

    fn bob() -> Address {
        Address::new([0xB0; 20])
    }

    fn id(n: u64) -> TokenId {
        TokenId::from(n)
    }

    fn amt(n: u64) -> Amount {
        Amount::from(n)
    }

    #[test]
    fn unseen_pair_is_zero() {
        let ledger = BalanceLedger::new();
        assert_eq!(ledger.balance_of(&alice(), &id(1)), Amount::zero());
    }

    #[test]
    fn credit_then_debit_leaves_difference() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&alice(), &id(1), amt(100)).unwrap();
        ledger.debit(&alice(), &id(1), amt(40)).unwrap();
        assert_eq!(ledger.balance_of(&alice(), &id(1)), amt(60));
    }

    #[test]
    fn debit_to_exactly_zero_is_allowed() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&alice(), &id(1), amt(5)).unwrap();
        ledger.debit(&alice(), &id(1), amt(5)).unwrap();
        assert_eq!(ledger.balance_of(&alice(), &id(1)), Amount::zero());
    }

    #[test]
    fn over_debit_fails_and_keeps_balance() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&alice(), &id(1), amt(10)).unwrap();
        let err = ledger.debit(&alice(), &id(1), amt(11)).unwrap_err();
        assert_eq!(
            err,
            ContractError::InsufficientBalance {
                account: alice(),
                token_id: id(1),
                balance: amt(10),
                requested: amt(11),
            }
        );
        assert_eq!(ledger.balance_of(&alice(), &id(1)), amt(10));
    }

    #[test]
    fn credit_overflow_is_hard_error() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&alice(), &id(1), Amount::MAX).unwrap();
        assert!(matches!(
            ledger.credit(&alice(), &id(1), amt(1)),
            Err(ContractError::BalanceOverflow { .. })
        ));
        assert_eq!(ledger.balance_of(&alice(), &id(1)), Amount::MAX);
    }

    #[test]
    fn balances_are_isolated_per_pair() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&alice(), &id(1), amt(10)).unwrap();
        ledger.credit(&bob(), &id(2), amt(20)).unwrap();
        assert_eq!(ledger.balance_of(&alice(), &id(2)), Amount::zero());
        assert_eq!(ledger.balance_of(&bob(), &id(1)), Amount::zero());
    }

    #[test]
    fn revert_restores_exact_map() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&alice(), &id(1), amt(10)).unwrap();
        let before = ledger.clone();

        let cp = ledger.checkpoint();
        ledger.credit(&alice(), &id(1), amt(5)).unwrap();
        ledger.credit(&bob(), &id(9), amt(1)).unwrap();
        ledger.revert_to(cp);

        assert!(ledger.same_balances(&before));
        assert_eq!(ledger.slot_count(), 1);
        assert!(!ledger.in_transaction());
    }

    #[test]
    fn outer_revert_undoes_committed_inner_checkpoint() {
        let mut ledger = BalanceLedger::new();
        let outer = ledger.checkpoint();
        ledger.credit(&alice(), &id(1), amt(1)).unwrap();
        let inner = ledger.checkpoint();
        ledger.credit(&alice(), &id(1), amt(2)).unwrap();
        ledger.commit(inner);
        assert!(ledger.in_transaction());
        ledger.revert_to(outer);
        assert_eq!(ledger.balance_of(&alice(), &id(1)), Amount::zero());
        assert_eq!(ledger.slot_count(), 0);
    }

    #[test]
    fn outer_revert_recovers_from_abandoned_inner_checkpoint() {
        let mut ledger = BalanceLedger::new();
        let outer = ledger.checkpoint();
        let _abandoned = ledger.checkpoint();
        ledger.credit(&alice(), &id(1), amt(3)).unwrap();
        ledger.revert_to(outer);
        assert!(!ledger.in_transaction());
        assert_eq!(ledger.slot_count(), 0);
    }

    #[test]
    fn commit_clears_journal_at_top_level() {
        let mut ledger = BalanceLedger::new();
        let cp = ledger.checkpoint();
        ledger.credit(&alice(), &id(1), amt(3)).unwrap();
        ledger.commit(cp);
        assert!(ledger.journal.is_empty());
        assert_eq!(ledger.balance_of(&alice(), &id(1)), amt(3));
    }

    #[test]
    fn debit_batch_is_all_or_nothing() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&alice(), &id(1), amt(10)).unwrap();
        ledger.credit(&alice(), &id(2), amt(1)).unwrap();

        let result = ledger.debit_batch(&alice(), &[id(1), id(2)], &[amt(5), amt(2)]);
        assert!(matches!(result, Err(ContractError::InsufficientBalance { .. })));
        assert_eq!(ledger.balance_of(&alice(), &id(1)), amt(10));
        assert_eq!(ledger.balance_of(&alice(), &id(2)), amt(1));
    }

    #[test]
    fn debit_batch_accumulates_duplicate_ids() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&alice(), &id(7), amt(8)).unwrap();
        assert!(ledger
            .debit_batch(&alice(), &[id(7), id(7)], &[amt(5), amt(5)])
            .is_err());
        assert_eq!(ledger.balance_of(&alice(), &id(7)), amt(8));

        ledger
            .debit_batch(&alice(), &[id(7), id(7)], &[amt(4), amt(4)])
            .unwrap();
        assert_eq!(ledger.balance_of(&alice(), &id(7)), Amount::zero());
    }

    #[test]
    fn credit_batch_rolls_back_on_overflow() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&alice(), &id(2), Amount::MAX).unwrap();
        let result = ledger.credit_batch(&alice(), &[id(1), id(2)], &[amt(5), amt(1)]);
        assert!(matches!(result, Err(ContractError::BalanceOverflow { .. })));
        assert_eq!(ledger.balance_of(&alice(), &id(1)), Amount::zero());
    }

    #[test]
    fn batch_length_mismatch() {
        let mut ledger = BalanceLedger::new();
        assert_eq!(
            ledger.credit_batch(&alice(), &[id(1)], &[]),
            Err(ContractError::LengthMismatch { ids: 1, amounts: 0 })
        );
        let err = ledger
            .balance_of_batch(&[alice(), bob()], &[id(1)])
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::QueryLengthMismatch { accounts: 2, ids: 1 }
        );
        assert_eq!(err.to_string(), "length mismatch: 2 accounts, 1 ids");
    }

    #[test]
    fn balance_of_batch_reads_pairs() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&alice(), &id(1), amt(10)).unwrap();
        ledger.credit(&bob(), &id(2), amt(20)).unwrap();
        let balances = ledger
            .balance_of_batch(&[alice(), bob(), bob()], &[id(1), id(2), id(1)])
            .unwrap();
        assert_eq!(balances, vec![amt(10), amt(20), Amount::zero()]);
    }

    #[test]
    fn non_zero_entries_are_sorted_and_filtered() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&bob(), &id(2), amt(20)).unwrap();
        ledger.credit(&alice(), &id(1), amt(10)).unwrap();
        ledger.credit(&alice(), &id(3), amt(1)).unwrap();
        ledger.debit(&alice(), &id(3), amt(1)).unwrap();

        let entries = ledger.non_zero_entries();
        assert_eq!(entries, vec![(alice(), id(1), amt(10)), (bob(), id(2), amt(20))]);
    }
}
