//! KafkaMessage and AvroMessage - records coming back from Kafka

use crate::catalog::{Catalog, TopicSchemas};
use crate::resolver::{decode_chunk, DecodedChunk};
use crate::{AvroError, AvroResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Raw record as received from the Kafka client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// Milliseconds since epoch, when the broker reports one
    pub timestamp: Option<i64>,
    pub key: Option<Vec<u8>>,
    pub value: Option<Vec<u8>>,
}

impl KafkaMessage {
    /// Create a message with neither key nor value
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            timestamp: None,
            key: None,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Size of the value in bytes
    pub fn size(&self) -> usize {
        self.value.as_ref().map_or(0, Vec::len)
    }
}

/// Record delivered to the application after key and value were decoded
///
/// Access fields through the provided accessor methods.
#[derive(Debug, Clone, PartialEq)]
pub struct AvroMessage {
    pub(crate) raw: KafkaMessage,
    pub(crate) value: Option<Value>,
    pub(crate) key: Option<Value>,
    pub(crate) value_schema_id: Option<i32>,
    pub(crate) key_schema_id: Option<i32>,
}

impl AvroMessage {
    /// Decode both chunks of `raw` with the catalogs of its topic
    pub(crate) fn decode(raw: KafkaMessage, schemas: &TopicSchemas, magic_byte: u8) -> AvroResult<Self> {
        let value = decode_optional(&schemas.value, raw.value.as_deref(), magic_byte)?;
        let key = decode_optional(&schemas.key, raw.key.as_deref(), magic_byte)?;

        Ok(Self {
            value_schema_id: value.as_ref().map(|chunk| chunk.schema_id),
            key_schema_id: key.as_ref().map(|chunk| chunk.schema_id),
            value: value.map(|chunk| chunk.value),
            key: key.map(|chunk| chunk.value),
            raw,
        })
    }

    /// Decoded value, `None` for a missing or zero-length value
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Decoded key, `None` for a missing or zero-length key
    pub fn key(&self) -> Option<&Value> {
        self.key.as_ref()
    }

    /// Schema id that decoded the value
    pub fn value_schema_id(&self) -> Option<i32> {
        self.value_schema_id
    }

    /// Schema id that decoded the key
    pub fn key_schema_id(&self) -> Option<i32> {
        self.key_schema_id
    }

    /// Deserialize the value to a specific type
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Deserialize)]
    /// struct Pet {
    ///     kind: String,
    ///     name: String,
    /// }
    ///
    /// let pet: Pet = message.value_as()?;
    /// ```
    pub fn value_as<T: DeserializeOwned>(&self) -> AvroResult<T> {
        deserialize_chunk(self.value.as_ref(), "value")
    }

    /// Deserialize the key to a specific type
    pub fn key_as<T: DeserializeOwned>(&self) -> AvroResult<T> {
        deserialize_chunk(self.key.as_ref(), "key")
    }

    pub fn topic(&self) -> &str {
        &self.raw.topic
    }

    pub fn partition(&self) -> i32 {
        self.raw.partition
    }

    pub fn offset(&self) -> i64 {
        self.raw.offset
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.raw.timestamp
    }

    /// Value bytes as received
    pub fn raw_value(&self) -> Option<&[u8]> {
        self.raw.value.as_deref()
    }

    /// Key bytes as received
    pub fn raw_key(&self) -> Option<&[u8]> {
        self.raw.key.as_deref()
    }

    /// The underlying Kafka record
    pub fn raw(&self) -> &KafkaMessage {
        &self.raw
    }

    pub fn into_raw(self) -> KafkaMessage {
        self.raw
    }
}

/// Zero-length and missing chunks decode to nothing
fn decode_optional(
    catalog: &Catalog,
    chunk: Option<&[u8]>,
    magic_byte: u8,
) -> AvroResult<Option<DecodedChunk>> {
    match chunk {
        Some(bytes) if !bytes.is_empty() => decode_chunk(catalog, bytes, magic_byte).map(Some),
        _ => Ok(None),
    }
}

fn deserialize_chunk<T: DeserializeOwned>(chunk: Option<&Value>, role: &str) -> AvroResult<T> {
    let value = chunk.cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| {
        AvroError::Serialization(format!("Failed to deserialize {} to target type: {}", role, e))
    })
}
