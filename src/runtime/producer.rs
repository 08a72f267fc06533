//! Producer adapter: encode with the loaded schemas, then delegate the send.

use crate::avro::is_empty_value;
use crate::config::ClientConfig;
use crate::message::{Payload, ProducerRecord};
use crate::metrics::CodecMetrics;
use crate::resolver::encode_chunk;
use crate::runtime::SchemaContext;
use crate::schema::SchemaRole;
use crate::traits::{KafkaTransport, OutboundRecord};
use crate::utils::serialization::fallback_bytes;
use crate::{AvroError, AvroResult};
use tracing::{debug, info, warn};

/// Wraps a [`KafkaTransport`] so every record is Avro-encoded before it is sent
///
/// Create with `AvroProducer::new()`, then `connect().await` and `produce(...)`.
pub struct AvroProducer<T: KafkaTransport> {
    transport: T,
    context: SchemaContext,
    fallback: bool,
    metrics: CodecMetrics,
}

impl<T: KafkaTransport> AvroProducer<T> {
    /// Create a producer without fallback
    pub fn new(transport: T, context: SchemaContext) -> Self {
        Self {
            transport,
            context,
            fallback: false,
            metrics: CodecMetrics::default(),
        }
    }

    /// Create a producer with the fallback flag, magic byte and metrics name of `config`
    pub fn from_config(transport: T, context: SchemaContext, config: &ClientConfig) -> Self {
        Self::new(transport, context.with_magic_byte(config.magic_byte))
            .with_fallback(config.fallback)
            .with_metrics(CodecMetrics::new(&config.client_name))
    }

    /// Default fallback for [`produce`](Self::produce) and [`produce_record`](Self::produce_record)
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_metrics(mut self, metrics: CodecMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn context(&self) -> &SchemaContext {
        &self.context
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Connect the underlying transport
    pub async fn connect(&mut self) -> AvroResult<()> {
        self.transport.connect().await?;
        info!("Avro producer connected");
        Ok(())
    }

    /// Disconnect the underlying transport
    pub async fn disconnect(&mut self) -> AvroResult<()> {
        self.transport.disconnect().await?;
        info!("Avro producer disconnected");
        Ok(())
    }

    /// Encode and send one record
    pub async fn produce(
        &self,
        topic: &str,
        partition: i32,
        value: Option<Payload>,
        key: Option<Payload>,
        timestamp: Option<i64>,
        opaque: Option<String>,
    ) -> AvroResult<()> {
        self.produce_record(ProducerRecord {
            topic: topic.to_string(),
            partition,
            value,
            key,
            timestamp,
            opaque,
        })
        .await
    }

    /// Encode and send one record with the producer's fallback setting
    pub async fn produce_record(&self, record: ProducerRecord) -> AvroResult<()> {
        self.produce_with_fallback(record, self.fallback).await
    }

    /// Encode and send one record, choosing fallback for this call only
    pub async fn produce_with_fallback(
        &self,
        record: ProducerRecord,
        fallback: bool,
    ) -> AvroResult<()> {
        let outbound = self.encode_record(record, fallback)?;
        debug!(
            topic = %outbound.topic,
            partition = outbound.partition,
            "sending record"
        );
        self.transport.send(outbound).await
    }

    /// Encode value and key without sending
    ///
    /// With `fallback` set, a chunk that cannot be encoded (including one for a
    /// topic without schemas) is sent as raw bytes or JSON text instead.
    pub fn encode_record(&self, record: ProducerRecord, fallback: bool) -> AvroResult<OutboundRecord> {
        let value = self.encode(&record.topic, SchemaRole::Value, record.value.as_ref(), fallback)?;
        let key = self.encode(&record.topic, SchemaRole::Key, record.key.as_ref(), fallback)?;

        Ok(OutboundRecord {
            topic: record.topic,
            partition: record.partition,
            value,
            key,
            timestamp: record.timestamp,
            opaque: record.opaque,
        })
    }

    fn encode(
        &self,
        topic: &str,
        role: SchemaRole,
        payload: Option<&Payload>,
        fallback: bool,
    ) -> AvroResult<Option<Vec<u8>>> {
        // Absent or empty chunks are never sent, whatever the topic
        let structured = match payload.and_then(Payload::to_structured) {
            Some(value) if !is_empty_value(&value) => value,
            _ => return Ok(None),
        };

        let encoded = match self.context.topic(topic) {
            Some(schemas) => encode_chunk(
                schemas.catalog(role),
                Some(&structured),
                self.context.magic_byte(),
            ),
            None => Err(AvroError::UnknownTopic(topic.to_string())),
        };

        match encoded {
            Ok(bytes) => {
                self.metrics.record_encoded(topic, role);
                Ok(Some(bytes))
            }
            Err(e) => {
                self.metrics.record_error(topic, e.kind());
                match payload {
                    Some(payload) if fallback => {
                        warn!(
                            topic = %topic,
                            role = %role,
                            error = %e,
                            "Avro encoding failed, sending fallback"
                        );
                        self.metrics.record_fallback(topic, role);
                        fallback_bytes(payload).map(Some)
                    }
                    _ => Err(e),
                }
            }
        }
    }
}
