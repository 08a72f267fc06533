//! Confluent wire format framing
//!
//! ```text
//! +------------+------------------------+------------------+
//! | magic (1)  | schema id (4, i32 BE)  | avro payload (N) |
//! +------------+------------------------+------------------+
//! ```
//!
//! Decoding with integrity checks lives in [`crate::avro`] so a wrong marker and a
//! wrong schema id can be reported separately.

use crate::{AvroError, AvroResult};

/// Default marker byte for framed records
pub const DEFAULT_MAGIC_BYTE: u8 = 0x00;

/// Offset of the magic byte
pub const MAGIC_BYTE_OFFSET: usize = 0;

/// Offset of the big-endian schema id
pub const SCHEMA_ID_OFFSET: usize = 1;

/// Offset of the Avro payload, also the header length
pub const PAYLOAD_OFFSET: usize = 5;

/// Largest envelope accepted, header included
pub const MAX_ENVELOPE_SIZE: usize = 8192;

/// Frame an Avro payload with its magic byte and schema id
///
/// Fails if `payload` is empty or the framed envelope would exceed
/// [`MAX_ENVELOPE_SIZE`] bytes.
pub fn encode_wire_format(payload: &[u8], schema_id: i32, magic_byte: u8) -> AvroResult<Vec<u8>> {
    if payload.is_empty() {
        return Err(AvroError::validation("Data cannot be empty"));
    }

    let size = PAYLOAD_OFFSET + payload.len();
    if size > MAX_ENVELOPE_SIZE {
        return Err(AvroError::validation(format!(
            "Buffer size is either too small or too big: {} bytes (max {})",
            size, MAX_ENVELOPE_SIZE
        )));
    }

    let mut buf = Vec::with_capacity(size);
    buf.push(magic_byte);
    buf.extend_from_slice(&schema_id.to_be_bytes());
    buf.extend_from_slice(payload);

    Ok(buf)
}

/// Read the embedded schema id without validating anything else
///
/// Returns `None` when the chunk is too short to carry a header.
pub fn peek_schema_id(data: &[u8]) -> Option<i32> {
    let id_bytes = data.get(SCHEMA_ID_OFFSET..PAYLOAD_OFFSET)?;
    Some(i32::from_be_bytes([
        id_bytes[0],
        id_bytes[1],
        id_bytes[2],
        id_bytes[3],
    ]))
}

/// Parse a magic byte given as a hex string (`"0x1"`, `"01"`)
pub fn parse_magic_byte(input: &str) -> AvroResult<u8> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    u8::from_str_radix(digits, 16)
        .map_err(|e| AvroError::validation(format!("Invalid magic byte '{}': {}", input, e)))
}

/// Parse a schema id given as a decimal string
pub fn parse_schema_id(input: &str) -> AvroResult<i32> {
    input
        .trim()
        .parse::<i32>()
        .map_err(|e| AvroError::validation(format!("Invalid schema id '{}': {}", input, e)))
}
