//! Integration tests for burn accounting and the mint/burn conservation
//! invariant.

use std::sync::Arc;

use assent_contracts::{ContractError, LedgerEvent, LedgerSnapshot, MultiToken, TokenVault};
use assent_protocol::types::{Address, Amount, TokenId};

fn n(v: u64) -> Amount {
    Amount::from(v)
}

/// A ledger with one vault holding 100 of token 1 and 50 of token 2.
fn funded() -> (MultiToken, Address) {
    let mut t = MultiToken::new(Address::new([0x1E; 20]), "ipfs://meta/{id}");
    let vault = Address::new([0x70; 20]);
    t.register_receiver(vault, Arc::new(TokenVault));
    t.mint_batch_to_contract(vault, vault, &[n(1), n(2)], &[n(100), n(50)], &[])
        .unwrap();
    t.drain_events();
    (t, vault)
}

#[test]
fn burn_then_balance_is_difference() {
    let (mut t, vault) = funded();
    t.burn(vault, vault, n(1), n(40)).unwrap();
    assert_eq!(t.balance_of(&vault, &n(1)), n(60));
    t.burn(vault, vault, n(1), n(60)).unwrap();
    assert_eq!(t.balance_of(&vault, &n(1)), Amount::zero());
}

#[test]
fn overdraw_leaves_balance() {
    let (mut t, vault) = funded();
    assert!(matches!(
        t.burn(vault, vault, n(1), n(101)),
        Err(ContractError::InsufficientBalance { .. })
    ));
    assert_eq!(t.balance_of(&vault, &n(1)), n(100));
    assert!(t.events().is_empty());
}

#[test]
fn burning_unseen_token_fails() {
    let (mut t, vault) = funded();
    let err = t.burn(vault, vault, n(99), n(1)).unwrap_err();
    assert_eq!(err.kind(), "InsufficientBalance");
}

#[test]
fn batch_burn_is_all_or_nothing() {
    let (mut t, vault) = funded();
    assert!(matches!(
        t.burn_batch(vault, vault, &[n(1), n(2)], &[n(10), n(51)]),
        Err(ContractError::InsufficientBalance { .. })
    ));
    assert_eq!(t.balance_of(&vault, &n(1)), n(100));
    assert_eq!(t.balance_of(&vault, &n(2)), n(50));

    t.burn_batch(vault, vault, &[n(1), n(2)], &[n(10), n(50)])
        .unwrap();
    assert_eq!(t.balance_of(&vault, &n(1)), n(90));
    assert_eq!(t.balance_of(&vault, &n(2)), Amount::zero());
    assert_eq!(
        t.events(),
        &[LedgerEvent::BurnBatch {
            operator: vault,
            from: vault,
            ids: vec![n(1), n(2)],
            amounts: vec![n(10), n(50)],
        }]
    );
}

#[test]
fn batch_burn_validation_order() {
    let (mut t, vault) = funded();
    assert_eq!(
        t.burn_batch(vault, Address::ZERO, &[n(1)], &[]),
        Err(ContractError::InvalidAccount)
    );
    assert_eq!(
        t.burn_batch(vault, vault, &[n(1)], &[]),
        Err(ContractError::LengthMismatch { ids: 1, amounts: 0 })
    );
}

#[test]
fn third_party_burn_is_allowed() {
    let (mut t, vault) = funded();
    let operator = Address::new([0x0B; 20]);
    t.burn(operator, vault, n(2), n(5)).unwrap();
    assert_eq!(
        t.events(),
        &[LedgerEvent::BurnSingle {
            operator,
            from: vault,
            id: n(2),
            amount: n(5),
        }]
    );
}

#[test]
fn minted_minus_burned_equals_balance() {
    let (mut t, vault) = funded();
    let mut expected = 100u64;
    for (mint, burn) in [(7u64, 3u64), (0, 10), (25, 25), (1, 0)] {
        t.mint_to_contract(vault, vault, n(1), n(mint), &[]).unwrap();
        t.burn(vault, vault, n(1), n(burn)).unwrap();
        expected = expected + mint - burn;
        assert_eq!(t.balance_of(&vault, &n(1)), n(expected));
    }
}

#[test]
fn snapshot_survives_burns() {
    let (mut t, vault) = funded();
    t.burn(vault, vault, n(2), n(50)).unwrap();
    let json = t.snapshot().to_json().unwrap();
    let restored = MultiToken::from_snapshot(&LedgerSnapshot::from_json(&json).unwrap()).unwrap();
    assert_eq!(restored.balances(), vec![(vault, TokenId::from(1u64), n(100))]);
    assert_eq!(restored.uri(&n(1)).len(), "ipfs://meta/".len() + 64);
}
