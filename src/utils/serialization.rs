//! Serialization helpers for the fallback path.
//!
//! When Avro encoding fails and fallback is enabled, a chunk is sent as its raw
//! bytes if it already is bytes, otherwise as its JSON text.

use crate::message::Payload;
use crate::{AvroError, AvroResult};
use serde::Serialize;

/// JSON serialization helpers
pub mod json {
    use super::*;

    /// Serialize a value to JSON bytes
    pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> AvroResult<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| AvroError::Serialization(format!("JSON serialization failed: {}", e)))
    }
}

/// Bytes sent for `payload` when Avro encoding is skipped
pub fn fallback_bytes(payload: &Payload) -> AvroResult<Vec<u8>> {
    match payload {
        Payload::Bytes(bytes) => Ok(bytes.clone()),
        Payload::Json(value) => json::to_bytes(value),
    }
}
