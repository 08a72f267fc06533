//! Avro encoding and decoding against a resolved schema.
//!
//! Structured values are `serde_json::Value`s; the schema decides how each JSON
//! value maps to Avro. Encoded records are framed in the Confluent wire format.

mod codec;
mod json;

pub use codec::{decode_avro, encode_avro, is_empty_value, CompiledSchema};
