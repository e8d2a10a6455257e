// Applying option actions against the full ledger state

use optledger::coin::Amount;
use optledger::escrow::Movement;
use optledger::identity::{Address, ADDRESS_LEN};
use optledger::ledger::{Applier, BlockClock, LedgerState, Receipt, Rejection};
use optledger::option::{
    Action, ActionCodec, ActionKind, CodecError, OptionAddress, OptionError, OptionState,
};

const EXPIRATION: u64 = 1000;

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; ADDRESS_LEN])
}

fn usd(q: u64) -> Amount {
    Amount::new("USD", q).unwrap()
}

fn btc(q: u64) -> Amount {
    Amount::new("BTC", q).unwrap()
}

/// Ledger at height 1 where A holds 100USD and B and C hold 10BTC each
fn genesis() -> LedgerState {
    let mut state = LedgerState::new();
    state.escrow_mut().credit(&addr(1), &usd(100)).unwrap();
    state.escrow_mut().credit(&addr(2), &btc(10)).unwrap();
    state.escrow_mut().credit(&addr(3), &btc(10)).unwrap();
    state.clock_mut().advance_to(1).unwrap();
    state
}

fn apply(state: &mut LedgerState, caller: Address, action: Action) -> Result<Receipt, Rejection> {
    Applier::apply(state, &caller, &action)
}

fn at(state: &mut LedgerState, height: u64) {
    state.clock_mut().advance_to(height).unwrap();
}

fn create(state: &mut LedgerState, creator: Address) -> OptionAddress {
    apply(state, creator, Action::create(usd(100), EXPIRATION))
        .unwrap()
        .option
}

fn assert_conserved(state: &LedgerState) {
    assert_eq!(state.escrow().total_supply("USD"), 100);
    assert_eq!(state.escrow().total_supply("BTC"), 20);
}

// ============================================================================
// SCENARIOS
// ============================================================================

/// Test: Create, offer, buy, exercise, then a late dissolve is refused
#[test]
fn test_full_lifecycle() {
    let (a, b) = (addr(1), addr(2));
    let mut state = genesis();

    let receipt = apply(&mut state, a, Action::create(usd(100), EXPIRATION)).unwrap();
    let option = receipt.option;
    assert_eq!(receipt.state, OptionState::Created);
    assert_eq!(
        receipt.movements,
        vec![Movement::Locked { from: a, contract: option, amount: usd(100) }]
    );
    assert_eq!(state.escrow().amount_of(&a, "USD"), 0);
    assert_eq!(state.escrow().bucket(&option).amount_of("USD"), 100);
    assert_conserved(&state);

    apply(&mut state, a, Action::sell(option, btc(10), None)).unwrap();
    assert_eq!(state.option(&option).unwrap().state(), OptionState::Offered);

    let bought = apply(&mut state, b, Action::buy(option)).unwrap();
    assert_eq!(bought.state, OptionState::Sold);
    assert_eq!(state.escrow().amount_of(&a, "BTC"), 10);
    assert_eq!(state.escrow().amount_of(&b, "BTC"), 0);
    assert_eq!(state.option(&option).unwrap().holder(), &b);
    assert_conserved(&state);

    at(&mut state, 500);
    let exercised = apply(&mut state, b, Action::exercise(option)).unwrap();
    assert_eq!(exercised.state, OptionState::Exercised);
    assert_eq!(exercised.height, 500);
    assert_eq!(state.escrow().amount_of(&b, "USD"), 100);
    assert!(state.escrow().bucket(&option).is_empty());
    assert_conserved(&state);

    let rejection = apply(&mut state, a, Action::dissolve(option)).unwrap_err();
    assert_eq!(
        rejection.error,
        OptionError::InvalidStateTransition {
            state: OptionState::Exercised,
            action: ActionKind::Dissolve
        }
    );
    assert_eq!(rejection.record.unwrap().state(), OptionState::Exercised);
}

/// Test: An unsold offer returns to the creator once expired
#[test]
fn test_expiry_dissolve() {
    let a = addr(1);
    let mut state = genesis();
    let option = create(&mut state, a);
    apply(&mut state, a, Action::sell(option, btc(10), None)).unwrap();

    at(&mut state, EXPIRATION - 1);
    let early = apply(&mut state, a, Action::dissolve(option)).unwrap_err();
    assert!(matches!(early.error, OptionError::NotYetEligibleForDissolve { .. }));

    at(&mut state, EXPIRATION);
    let receipt = apply(&mut state, a, Action::dissolve(option)).unwrap();
    assert_eq!(receipt.state, OptionState::Dissolved);
    assert_eq!(state.escrow().amount_of(&a, "USD"), 100);
    assert!(state.escrow().bucket(&option).is_empty());
    assert_conserved(&state);
}

/// Test: A restricted offer turns away everyone but the named buyer
#[test]
fn test_restricted_buyer() {
    let (a, b, c) = (addr(1), addr(2), addr(3));
    let mut state = genesis();
    let option = create(&mut state, a);
    apply(&mut state, a, Action::sell(option, btc(10), Some(c))).unwrap();

    let refused = apply(&mut state, b, Action::buy(option)).unwrap_err();
    assert_eq!(
        refused.error,
        OptionError::Unauthorized { caller: b, action: ActionKind::Buy }
    );
    assert_eq!(state.escrow().amount_of(&b, "BTC"), 10);

    apply(&mut state, c, Action::buy(option)).unwrap();
    assert_eq!(state.option(&option).unwrap().holder(), &c);
    assert_eq!(state.escrow().amount_of(&a, "BTC"), 10);
    assert_conserved(&state);
}

// ============================================================================
// EXPIRATION BOUNDARY
// ============================================================================

/// Test: Exercise succeeds at expiration - 1 and fails at expiration
#[test]
fn test_expiration_boundary() {
    let (a, b) = (addr(1), addr(2));

    let mut state = genesis();
    let option = create(&mut state, a);
    apply(&mut state, a, Action::sell(option, btc(10), None)).unwrap();
    apply(&mut state, b, Action::buy(option)).unwrap();
    let sold = state.clone();

    at(&mut state, EXPIRATION - 1);
    assert!(apply(&mut state, b, Action::exercise(option)).is_ok());

    let mut state = sold;
    at(&mut state, EXPIRATION);
    let rejection = apply(&mut state, b, Action::exercise(option)).unwrap_err();
    assert_eq!(
        rejection.error,
        OptionError::Expired { height: EXPIRATION, expiration: EXPIRATION }
    );

    // After expiry the creator recovers the trade from a sold option
    let receipt = apply(&mut state, a, Action::dissolve(option)).unwrap();
    assert_eq!(receipt.state, OptionState::Dissolved);
    assert_eq!(state.escrow().amount_of(&a, "USD"), 100);
    assert_eq!(state.escrow().amount_of(&a, "BTC"), 10);
}

/// Test: The oracle passed in decides the height, not the state's clock
#[test]
fn test_apply_with_explicit_oracle() {
    let (a, b) = (addr(1), addr(2));
    let mut state = genesis();
    let option = create(&mut state, a);
    apply(&mut state, a, Action::sell(option, btc(10), None)).unwrap();
    apply(&mut state, b, Action::buy(option)).unwrap();

    let late = BlockClock::at(EXPIRATION + 10);
    let rejection = Applier::apply_with_oracle(&mut state, &late, &b, &Action::exercise(option)).unwrap_err();
    assert!(matches!(rejection.error, OptionError::Expired { .. }));
    assert_eq!(state.height(), 1);
}

// ============================================================================
// REJECTIONS ARE NO-OPS
// ============================================================================

/// Test: Every kind of rejection leaves the ledger exactly as it was
#[test]
fn test_rejections_leave_state_untouched() {
    let (a, b, c) = (addr(1), addr(2), addr(3));
    let mut state = genesis();
    let option = create(&mut state, a);
    apply(&mut state, a, Action::sell(option, btc(10), None)).unwrap();

    let missing = OptionAddress::derive(&c, 42);
    let attempts = vec![
        (c, Action::sell(option, btc(1), None)),
        (a, Action::buy(option)),
        (b, Action::exercise(option)),
        (b, Action::dissolve(option)),
        (a, Action::dissolve(option)),
        (b, Action::buy(missing)),
        (b, Action::create(usd(1), EXPIRATION)),
        (a, Action::create(usd(1), 1)),
        (a, Action::sell(option, btc(0), None)),
    ];

    for (caller, action) in attempts {
        let before = state.clone();
        assert!(apply(&mut state, caller, action.clone()).is_err(), "{action:?} should fail");
        assert_eq!(state, before, "{action:?} changed the ledger");
    }
}

/// Test: A buyer who cannot pay is refused and the offer stays open
#[test]
fn test_buy_insufficient_funds() {
    let a = addr(1);
    let broke = addr(9);
    let mut state = genesis();
    let option = create(&mut state, a);
    apply(&mut state, a, Action::sell(option, btc(10), None)).unwrap();

    let rejection = apply(&mut state, broke, Action::buy(option)).unwrap_err();
    assert!(matches!(
        rejection.error,
        OptionError::InsufficientFunds { available: 0, .. }
    ));
    let record = state.option(&option).unwrap();
    assert_eq!(record.state(), OptionState::Offered);
    assert_eq!(record.holder(), &a);
}

/// Test: A failed Create does not use up the creator's next address
#[test]
fn test_failed_create_keeps_address() {
    let a = addr(1);
    let mut state = genesis();
    let next = state.next_option_address(&a);

    assert!(apply(&mut state, a, Action::create(usd(101), EXPIRATION)).is_err());
    assert_eq!(state.next_option_address(&a), next);
    assert!(!state.has_option(&next));

    let receipt = apply(&mut state, a, Action::create(usd(100), EXPIRATION)).unwrap();
    assert_eq!(receipt.option, next);
}

/// Test: Unknown contracts are reported as not found
#[test]
fn test_not_found() {
    let mut state = genesis();
    let missing = OptionAddress::from_bytes([0xee; ADDRESS_LEN]);
    let rejection = apply(&mut state, addr(1), Action::exercise(missing)).unwrap_err();
    assert_eq!(rejection.error, OptionError::NotFound(missing));
    assert!(rejection.record.is_none());
}

// ============================================================================
// ENCODED SUBMISSIONS
// ============================================================================

/// Test: Codec bytes are decoded and applied
#[test]
fn test_apply_bytes() {
    let a = addr(1);
    let mut state = genesis();
    let bytes = ActionCodec::encode(&Action::create(usd(40), EXPIRATION));

    let receipt = Applier::apply_bytes(&mut state, &a, &bytes).unwrap();
    assert_eq!(receipt.action, ActionKind::Create);
    assert_eq!(state.escrow().amount_of(&a, "USD"), 60);
}

/// Test: Undecodable bytes are rejected as malformed
#[test]
fn test_apply_malformed_bytes() {
    let mut state = genesis();
    let before = state.clone();

    let rejection = Applier::apply_bytes(&mut state, &addr(1), &[0x42, 0x00]).unwrap_err();
    assert_eq!(
        rejection.error,
        OptionError::MalformedEncoding(CodecError::UnknownTag(0x42))
    );
    assert_eq!(state, before);
}

// ============================================================================
// MULTIPLE CONTRACTS
// ============================================================================

/// Test: Successive creates get distinct addresses and separate buckets
#[test]
fn test_multiple_contracts() {
    let a = addr(1);
    let mut state = genesis();

    let first = apply(&mut state, a, Action::create(usd(30), EXPIRATION)).unwrap().option;
    let second = apply(&mut state, a, Action::create(usd(70), EXPIRATION)).unwrap().option;
    assert_ne!(first, second);
    assert_eq!(state.create_sequence(&a), 2);

    apply(&mut state, a, Action::dissolve(first)).unwrap();
    assert_eq!(state.escrow().amount_of(&a, "USD"), 30);
    assert_eq!(state.escrow().bucket(&second).amount_of("USD"), 70);

    let stats = state.statistics();
    assert_eq!(stats.total_options, 2);
    assert_eq!(stats.created, 1);
    assert_eq!(stats.dissolved, 1);
    assert_conserved(&state);
}
