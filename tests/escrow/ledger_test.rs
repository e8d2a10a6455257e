// Escrow ledger: account purses, contract buckets and atomic movements

use optledger::coin::Amount;
use optledger::escrow::{EscrowError, EscrowLedger, Movement};
use optledger::identity::{Address, ADDRESS_LEN};
use optledger::option::OptionAddress;

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; ADDRESS_LEN])
}

fn usd(q: u64) -> Amount {
    Amount::new("USD", q).unwrap()
}

fn funded(account: Address, amount: Amount) -> EscrowLedger {
    let mut ledger = EscrowLedger::new();
    ledger.credit(&account, &amount).unwrap();
    ledger
}

// ============================================================================
// CREDIT
// ============================================================================

/// Test: Credit mints into the account and reports it
#[test]
fn test_credit_mints() {
    let mut ledger = EscrowLedger::new();
    let movement = ledger.credit(&addr(1), &usd(50)).unwrap();

    assert_eq!(movement, Movement::Minted { to: addr(1), amount: usd(50) });
    assert_eq!(ledger.amount_of(&addr(1), "USD"), 50);
    assert_eq!(ledger.total_supply("USD"), 50);
}

/// Test: Crediting zero leaves no empty purse behind
#[test]
fn test_zero_credit_leaves_no_purse() {
    let mut ledger = EscrowLedger::new();
    ledger.credit(&addr(1), &usd(0)).unwrap();
    assert_eq!(ledger, EscrowLedger::new());
}

// ============================================================================
// LOCK / RELEASE
// ============================================================================

/// Test: Lock moves funds into the contract bucket
#[test]
fn test_lock_debits_account() {
    let a = addr(1);
    let contract = OptionAddress::derive(&a, 0);
    let mut ledger = funded(a, usd(120));

    let movement = ledger.lock(&a, &usd(100), &contract).unwrap();

    assert!(movement.touches_escrow());
    assert_eq!(ledger.amount_of(&a, "USD"), 20);
    assert_eq!(ledger.bucket(&contract).amount_of("USD"), 100);
    assert_eq!(ledger.total_supply("USD"), 120);
}

/// Test: Locking more than the balance fails and changes nothing
#[test]
fn test_lock_insufficient_funds() {
    let a = addr(1);
    let contract = OptionAddress::derive(&a, 0);
    let mut ledger = funded(a, usd(99));
    let before = ledger.clone();

    let result = ledger.lock(&a, &usd(100), &contract);

    assert_eq!(
        result,
        Err(EscrowError::InsufficientFunds {
            holder: a.to_string(),
            available: 99,
            required: usd(100),
        })
    );
    assert_eq!(ledger, before);
}

/// Test: Release pays out of the bucket and empties it
#[test]
fn test_release_to_other_account() {
    let a = addr(1);
    let b = addr(2);
    let contract = OptionAddress::derive(&a, 0);
    let mut ledger = funded(a, usd(100));
    ledger.lock(&a, &usd(100), &contract).unwrap();

    let movement = ledger.release(&contract, &usd(100), &b).unwrap();

    assert_eq!(
        movement,
        Movement::Released { contract, to: b, amount: usd(100) }
    );
    assert!(ledger.bucket(&contract).is_empty());
    assert_eq!(ledger.buckets().count(), 0);
    assert_eq!(ledger.amount_of(&b, "USD"), 100);
    assert_eq!(ledger.amount_of(&a, "USD"), 0);
}

/// Test: A bucket cannot release more than it holds
#[test]
fn test_release_more_than_locked() {
    let a = addr(1);
    let contract = OptionAddress::derive(&a, 0);
    let mut ledger = funded(a, usd(10));
    ledger.lock(&a, &usd(10), &contract).unwrap();
    let before = ledger.clone();

    let result = ledger.release(&contract, &usd(11), &a);
    assert!(matches!(result, Err(EscrowError::InsufficientFunds { available: 10, .. })));
    assert_eq!(ledger, before);
}

/// Test: Buckets are isolated per contract
#[test]
fn test_buckets_are_isolated() {
    let a = addr(1);
    let first = OptionAddress::derive(&a, 0);
    let second = OptionAddress::derive(&a, 1);
    let mut ledger = funded(a, usd(30));
    ledger.lock(&a, &usd(10), &first).unwrap();
    ledger.lock(&a, &usd(20), &second).unwrap();

    assert!(ledger.release(&first, &usd(20), &a).is_err());
    assert_eq!(ledger.bucket(&first).amount_of("USD"), 10);
    assert_eq!(ledger.bucket(&second).amount_of("USD"), 20);
}

// ============================================================================
// DIRECT TRANSFER
// ============================================================================

/// Test: Direct transfer bypasses every bucket
#[test]
fn test_transfer_direct() {
    let a = addr(1);
    let b = addr(2);
    let btc = Amount::new("BTC", 10).unwrap();
    let mut ledger = funded(b, btc.clone());

    let movement = ledger.transfer_direct(&b, &a, &btc).unwrap();

    assert!(!movement.touches_escrow());
    assert_eq!(ledger.amount_of(&a, "BTC"), 10);
    assert_eq!(ledger.amount_of(&b, "BTC"), 0);
    assert_eq!(ledger.buckets().count(), 0);
}

/// Test: Transferring in the wrong denomination fails
#[test]
fn test_transfer_wrong_denomination() {
    let a = addr(1);
    let mut ledger = funded(a, usd(100));
    let before = ledger.clone();

    let result = ledger.transfer_direct(&a, &addr(2), &Amount::new("BTC", 1).unwrap());
    assert!(matches!(result, Err(EscrowError::InsufficientFunds { available: 0, .. })));
    assert_eq!(ledger, before);
}

/// Test: A self-transfer must still be covered but changes nothing
#[test]
fn test_self_transfer() {
    let a = addr(1);
    let mut ledger = funded(a, usd(5));
    let before = ledger.clone();

    assert!(ledger.transfer_direct(&a, &a, &usd(5)).is_ok());
    assert_eq!(ledger, before);
    assert!(ledger.transfer_direct(&a, &a, &usd(6)).is_err());
}
