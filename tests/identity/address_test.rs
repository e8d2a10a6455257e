use optledger::identity::{strip_hex, Address, AddressError, Keypair, ADDRESS_LEN};

// ============================================================================
// DERIVATION
// ============================================================================

/// Test: The same key always derives the same address
#[test]
fn test_address_is_deterministic() {
    let keypair = Keypair::generate();
    assert_eq!(
        Address::from_public_key(&keypair.public_key()),
        Address::from_public_key(&keypair.public_key())
    );
}

/// Test: Different keys derive different addresses
#[test]
fn test_distinct_keys_distinct_addresses() {
    let a = Address::from_public_key(&Keypair::generate().public_key());
    let b = Address::from_public_key(&Keypair::generate().public_key());
    assert_ne!(a, b);
}

// ============================================================================
// TEXT FORM
// ============================================================================

/// Test: Display is 40 uppercase hex characters and parses back
#[test]
fn test_display_parse_round_trip() {
    let address = Address::from_public_key(&Keypair::generate().public_key());
    let text = address.to_string();

    assert_eq!(text.len(), ADDRESS_LEN * 2);
    assert_eq!(text, text.to_uppercase());
    assert_eq!(Address::parse(&text).unwrap(), address);
}

/// Test: A 0x prefix and lowercase hex are accepted
#[test]
fn test_parse_accepts_prefix_and_lowercase() {
    let address = Address::from_bytes([0xab; ADDRESS_LEN]);
    let text = format!("0x{}", address.to_string().to_lowercase());

    assert_eq!(text.parse::<Address>().unwrap(), address);
}

/// Test: strip_hex only removes a leading 0x
#[test]
fn test_strip_hex() {
    assert_eq!(strip_hex("0xDEAD"), "DEAD");
    assert_eq!(strip_hex("DEAD"), "DEAD");
    assert_eq!(strip_hex("DE0xAD"), "DE0xAD");
}

/// Test: Non-hex input is refused
#[test]
fn test_parse_rejects_bad_hex() {
    assert!(matches!(Address::parse("zz"), Err(AddressError::InvalidHex(_))));
}

/// Test: Hex of the wrong length is refused
#[test]
fn test_parse_rejects_wrong_length() {
    assert!(matches!(Address::parse("abcd"), Err(AddressError::InvalidLength(2))));
}
