// Wire codec for option actions: one tag byte followed by a postcard payload

use optledger::coin::Amount;
use optledger::identity::{Address, ADDRESS_LEN};
use optledger::option::{Action, ActionCodec, ActionKind, CodecError, OptionAddress};
use serde::Serialize;

fn contract() -> OptionAddress {
    OptionAddress::derive(&Address::from_bytes([7u8; ADDRESS_LEN]), 0)
}

fn every_action() -> Vec<Action> {
    vec![
        Action::create(Amount::new("USD", 100).unwrap(), 1000),
        Action::sell(contract(), Amount::new("BTC", 10).unwrap(), None),
        Action::sell(
            contract(),
            Amount::new("BTC", 10).unwrap(),
            Some(Address::from_bytes([9u8; ADDRESS_LEN])),
        ),
        Action::buy(contract()),
        Action::exercise(contract()),
        Action::dissolve(contract()),
    ]
}

// ============================================================================
// ROUND TRIPS
// ============================================================================

/// Test: Every variant decodes back to itself
#[test]
fn test_round_trip_every_variant() {
    for action in every_action() {
        let bytes = ActionCodec::encode(&action);
        assert_eq!(ActionCodec::decode(&bytes).unwrap(), action);
    }
}

/// Test: The first byte is the variant's type tag
#[test]
fn test_type_tags() {
    let expected = [0x01, 0x02, 0x02, 0x03, 0x04, 0x05];
    for (action, tag) in every_action().iter().zip(expected) {
        assert_eq!(ActionCodec::encode(action)[0], tag);
        assert_eq!(ActionKind::from_tag(tag), Some(action.kind()));
    }
}

/// Test: Hex form round-trips, with or without 0x
#[test]
fn test_hex_round_trip() {
    let action = Action::exercise(contract());
    let hex = ActionCodec::encode_hex(&action);

    assert_eq!(ActionCodec::decode_hex(&hex).unwrap(), action);
    assert_eq!(ActionCodec::decode_hex(&format!("0x{hex}")).unwrap(), action);
}

/// Test: Base64 form round-trips
#[test]
fn test_base64_round_trip() {
    let action = Action::sell(contract(), Amount::new("ETH", 3).unwrap(), None);
    let b64 = ActionCodec::encode_base64(&action);
    assert_eq!(ActionCodec::decode_base64(&b64).unwrap(), action);
}

// ============================================================================
// MALFORMED INPUT
// ============================================================================

/// Test: Empty input has no tag
#[test]
fn test_empty_input() {
    assert_eq!(ActionCodec::decode(&[]), Err(CodecError::Empty));
}

/// Test: Tags outside 0x01..=0x05 are refused
#[test]
fn test_unknown_tags() {
    for tag in [0x00, 0x06, 0x7f, 0xff] {
        assert_eq!(ActionCodec::decode(&[tag]), Err(CodecError::UnknownTag(tag)));
    }
}

/// Test: A truncated payload is malformed
#[test]
fn test_truncated_payload() {
    let bytes = ActionCodec::encode(&Action::buy(contract()));
    let result = ActionCodec::decode(&bytes[..bytes.len() - 1]);
    assert!(matches!(result, Err(CodecError::MalformedPayload(_))));
}

/// Test: A tag with no payload is malformed
#[test]
fn test_tag_without_payload() {
    assert!(matches!(
        ActionCodec::decode(&[0x01]),
        Err(CodecError::MalformedPayload(_))
    ));
}

/// Test: Bytes after a complete payload are refused
#[test]
fn test_trailing_bytes() {
    let mut bytes = ActionCodec::encode(&Action::dissolve(contract()));
    bytes.extend_from_slice(&[0xde, 0xad]);
    assert_eq!(ActionCodec::decode(&bytes), Err(CodecError::TrailingBytes(2)));
}

/// Test: A well-formed payload carrying a bad denomination is refused
#[test]
fn test_invalid_denomination_in_payload() {
    #[derive(Serialize)]
    struct RawAmount {
        denom: String,
        quantity: u64,
    }

    #[derive(Serialize)]
    struct RawCreate {
        trade: RawAmount,
        expiration_height: u64,
    }

    let payload = postcard::to_allocvec(&RawCreate {
        trade: RawAmount {
            denom: "U$D".to_string(),
            quantity: 5,
        },
        expiration_height: 10,
    })
    .unwrap();

    let mut bytes = vec![ActionKind::Create.tag()];
    bytes.extend_from_slice(&payload);

    assert!(matches!(
        ActionCodec::decode(&bytes),
        Err(CodecError::InvalidAmount(_))
    ));
}

/// Test: Text wrappers report their own decoding errors
#[test]
fn test_bad_text_encodings() {
    assert!(matches!(ActionCodec::decode_hex("0xzz"), Err(CodecError::InvalidHex(_))));
    assert!(matches!(
        ActionCodec::decode_base64("***"),
        Err(CodecError::InvalidBase64(_))
    ));
}
