use crate::identity::strip_hex;
use crate::option::{
    Action, ActionKind, BuyOption, CreateOption, DissolveOption, ExerciseOption, SellOption,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Empty input: missing type tag")]
    Empty,

    #[error("Unknown type tag: 0x{0:02x}")]
    UnknownTag(u8),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Trailing bytes after payload: {0}")]
    TrailingBytes(usize),

    #[error("Invalid amount in payload: {0}")]
    InvalidAmount(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid base64 string: {0}")]
    InvalidBase64(String),
}

/// Codec for option actions: one type tag byte followed by a postcard payload
pub struct ActionCodec;

impl ActionCodec {
    pub fn encode(action: &Action) -> Vec<u8> {
        let tag = action.kind().tag();
        match action {
            Action::Create(payload) => frame(tag, payload),
            Action::Sell(payload) => frame(tag, payload),
            Action::Buy(payload) => frame(tag, payload),
            Action::Exercise(payload) => frame(tag, payload),
            Action::Dissolve(payload) => frame(tag, payload),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Action, CodecError> {
        let (&tag, payload) = bytes.split_first().ok_or(CodecError::Empty)?;
        let kind = ActionKind::from_tag(tag).ok_or(CodecError::UnknownTag(tag))?;

        let action = match kind {
            ActionKind::Create => {
                let create: CreateOption = payload_from(payload)?;
                create
                    .trade
                    .validate()
                    .map_err(|e| CodecError::InvalidAmount(e.to_string()))?;
                Action::Create(create)
            }
            ActionKind::Sell => {
                let sell: SellOption = payload_from(payload)?;
                sell.price
                    .validate()
                    .map_err(|e| CodecError::InvalidAmount(e.to_string()))?;
                Action::Sell(sell)
            }
            ActionKind::Buy => Action::Buy(payload_from::<BuyOption>(payload)?),
            ActionKind::Exercise => Action::Exercise(payload_from::<ExerciseOption>(payload)?),
            ActionKind::Dissolve => Action::Dissolve(payload_from::<DissolveOption>(payload)?),
        };

        Ok(action)
    }

    pub fn encode_hex(action: &Action) -> String {
        hex::encode(Self::encode(action))
    }

    /// Decode from hex; a leading `0x` is accepted
    pub fn decode_hex(hex_str: &str) -> Result<Action, CodecError> {
        let bytes = hex::decode(strip_hex(hex_str.trim()))
            .map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Encode to base64 string (URL-safe, no padding)
    pub fn encode_base64(action: &Action) -> String {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        URL_SAFE_NO_PAD.encode(Self::encode(action))
    }

    pub fn decode_base64(b64_str: &str) -> Result<Action, CodecError> {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        let bytes = URL_SAFE_NO_PAD
            .decode(b64_str.trim())
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;
        Self::decode(&bytes)
    }
}

fn frame<T: Serialize>(tag: u8, payload: &T) -> Vec<u8> {
    // postcard only fails on writer errors, which cannot happen with an allocating Vec
    let body = postcard::to_allocvec(payload).unwrap_or_default();
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(tag);
    out.extend_from_slice(&body);
    out
}

fn payload_from<T: DeserializeOwned>(payload: &[u8]) -> Result<T, CodecError> {
    let (value, rest) = postcard::take_from_bytes::<T>(payload)
        .map_err(|e| CodecError::MalformedPayload(e.to_string()))?;
    if !rest.is_empty() {
        return Err(CodecError::TrailingBytes(rest.len()));
    }
    Ok(value)
}
