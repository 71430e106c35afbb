//! JSON payload bodies.
//!
//! Configuration commands and status replies carry UTF-8 JSON objects.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::codec::MAX_PAYLOAD;
use crate::error::{FrameError, Result};

/// Serialize `value` as a compact JSON payload.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(value)?;
    if bytes.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: bytes.len(),
            max: MAX_PAYLOAD,
        });
    }
    Ok(bytes)
}

/// Parse a JSON payload into `T`.
pub fn decode_json<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(payload)?)
}

/// Parse a payload as a JSON object, returning `None` for anything else.
///
/// Empty payloads, invalid UTF-8/JSON and non-object values all yield `None`.
pub fn decode_json_object(payload: &[u8]) -> Option<Map<String, Value>> {
    if payload.is_empty() {
        return None;
    }
    match decode_json(payload) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
