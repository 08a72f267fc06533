//! ProducerRecord - application data on its way to Kafka

use crate::{AvroError, AvroResult};
use base64::Engine;
use serde::Serialize;
use serde_json::Value;

/// Partition hint that lets the Kafka client pick a partition
pub const DEFAULT_PARTITION: i32 = -1;

/// Key or value handed to the producer
///
/// Structured values are encoded with the catalog schema. Raw bytes are encoded
/// as an Avro `bytes` value (base64 on the JSON side) and, on fallback, sent
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured data
    Json(Value),
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl Payload {
    /// Structured form used for Avro encoding, `None` when there is nothing to send
    pub(crate) fn to_structured(&self) -> Option<Value> {
        match self {
            Payload::Json(value) => Some(value.clone()),
            Payload::Bytes(bytes) if bytes.is_empty() => None,
            Payload::Bytes(bytes) => Some(Value::String(
                base64::engine::general_purpose::STANDARD.encode(bytes),
            )),
        }
    }

    /// Create a payload from any serializable value
    pub fn from_json<T: Serialize>(data: T) -> AvroResult<Self> {
        serde_json::to_value(data)
            .map(Payload::Json)
            .map_err(|e| AvroError::Serialization(e.to_string()))
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Json(Value::String(text.to_string()))
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Json(Value::String(text))
    }
}

/// Record handed to [`AvroProducer`](crate::AvroProducer)
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerRecord {
    /// The topic to publish to
    pub topic: String,
    /// Partition, [`DEFAULT_PARTITION`] to let the client decide
    pub partition: i32,
    /// Record value
    pub value: Option<Payload>,
    /// Record key
    pub key: Option<Payload>,
    /// Milliseconds since epoch
    pub timestamp: Option<i64>,
    /// Token passed through to the transport untouched
    pub opaque: Option<String>,
}

impl ProducerRecord {
    /// Create a record with a value and no key
    pub fn new(topic: impl Into<String>, value: impl Into<Payload>) -> Self {
        Self {
            topic: topic.into(),
            partition: DEFAULT_PARTITION,
            value: Some(value.into()),
            key: None,
            timestamp: None,
            opaque: None,
        }
    }

    /// Create a record from any JSON-serializable object
    ///
    /// # Example
    /// ```ignore
    /// #[derive(Serialize)]
    /// struct Pet {
    ///     kind: String,
    ///     name: String,
    /// }
    ///
    /// let record = ProducerRecord::from_json("pets", &Pet { kind: "DOG".into(), name: "Kiara".into() })?;
    /// ```
    pub fn from_json<T: Serialize>(topic: impl Into<String>, data: T) -> AvroResult<Self> {
        Ok(Self::new(topic, Payload::from_json(data)?))
    }

    /// Create a record carrying raw bytes
    pub fn from_bytes(topic: impl Into<String>, data: Vec<u8>) -> Self {
        Self::new(topic, Payload::Bytes(data))
    }

    /// Create a tombstone: a key with no value
    pub fn tombstone(topic: impl Into<String>, key: impl Into<Payload>) -> Self {
        Self {
            topic: topic.into(),
            partition: DEFAULT_PARTITION,
            value: None,
            key: Some(key.into()),
            timestamp: None,
            opaque: None,
        }
    }

    /// Set the key
    pub fn with_key(mut self, key: impl Into<Payload>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the partition
    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = partition;
        self
    }

    /// Set the timestamp (milliseconds since epoch)
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attach an opaque token for the transport
    pub fn with_opaque(mut self, opaque: impl Into<String>) -> Self {
        self.opaque = Some(opaque.into());
        self
    }
}
