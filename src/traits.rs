//! Transport capability the producer adapter is built on.
//!
//! The Kafka protocol itself (brokers, partition assignment, delivery) belongs
//! to an external client. [`KafkaTransport`] is the seam: the producer adapter
//! encodes records and delegates the send.

use crate::AvroResult;
use async_trait::async_trait;

/// Framed record ready for the Kafka client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRecord {
    pub topic: String,
    /// Partition, negative to let the client decide
    pub partition: i32,
    /// Value bytes, `None` for a tombstone
    pub value: Option<Vec<u8>>,
    /// Key bytes, `None` for no key
    pub key: Option<Vec<u8>>,
    /// Milliseconds since epoch
    pub timestamp: Option<i64>,
    /// Token passed through from the producer record
    pub opaque: Option<String>,
}

/// Connect, disconnect and send primitives of a Kafka producer client
///
/// # Example
///
/// ```rust,no_run
/// use kafka_avro_core::{AvroResult, KafkaTransport, OutboundRecord};
/// use async_trait::async_trait;
///
/// pub struct StdoutTransport;
///
/// #[async_trait]
/// impl KafkaTransport for StdoutTransport {
///     async fn connect(&mut self) -> AvroResult<()> {
///         Ok(())
///     }
///
///     async fn disconnect(&mut self) -> AvroResult<()> {
///         Ok(())
///     }
///
///     async fn send(&self, record: OutboundRecord) -> AvroResult<()> {
///         println!("{} <- {:?}", record.topic, record.value);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait KafkaTransport: Send + Sync {
    /// Connect to the cluster
    ///
    /// # Errors
    ///
    /// Return `AvroError::Transport` when the client cannot connect
    async fn connect(&mut self) -> AvroResult<()>;

    /// Flush pending records and disconnect
    async fn disconnect(&mut self) -> AvroResult<()>;

    /// Send one framed record
    ///
    /// Failures are reported as `AvroError::Transport` and are not retried by
    /// the adapter.
    async fn send(&self, record: OutboundRecord) -> AvroResult<()>;
}
