//! Utility modules.

pub mod serialization;

pub use serialization::{fallback_bytes, json};
