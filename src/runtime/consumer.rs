//! Consumer adapter: a stage turning raw Kafka records into decoded records.

use crate::config::ClientConfig;
use crate::message::{AvroMessage, KafkaMessage};
use crate::metrics::CodecMetrics;
use crate::runtime::SchemaContext;
use crate::schema::SchemaRole;
use crate::AvroResult;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Decodes records received from Kafka with the loaded schemas
///
/// Records of topics without loaded schemas are dropped. Decode failures of
/// known topics are reported, never dropped.
#[derive(Debug, Clone)]
pub struct AvroConsumer {
    context: SchemaContext,
    metrics: CodecMetrics,
    channel_capacity: usize,
}

impl AvroConsumer {
    pub fn new(context: SchemaContext) -> Self {
        Self {
            context,
            metrics: CodecMetrics::default(),
            channel_capacity: 100,
        }
    }

    /// Create a consumer with the channel capacity, magic byte and metrics name of `config`
    pub fn from_config(context: SchemaContext, config: &ClientConfig) -> Self {
        Self::new(context.with_magic_byte(config.magic_byte))
            .with_channel_capacity(config.channel_capacity)
            .with_metrics(CodecMetrics::new(&config.client_name))
    }

    pub fn with_metrics(mut self, metrics: CodecMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Capacity of the channel returned by [`spawn`](Self::spawn), at least 1
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn context(&self) -> &SchemaContext {
        &self.context
    }

    /// Decode one record
    ///
    /// Returns `Ok(None)` when the record's topic has no loaded schemas.
    pub fn decode_message(&self, message: KafkaMessage) -> AvroResult<Option<AvroMessage>> {
        let Some(schemas) = self.context.topic(&message.topic) else {
            debug!(topic = %message.topic, offset = message.offset, "dropping record of unknown topic");
            self.metrics.record_dropped(&message.topic);
            return Ok(None);
        };

        let topic = message.topic.clone();
        match AvroMessage::decode(message, schemas, self.context.magic_byte()) {
            Ok(decoded) => {
                if decoded.value_schema_id().is_some() {
                    self.metrics.record_decoded(&topic, SchemaRole::Value);
                }
                if decoded.key_schema_id().is_some() {
                    self.metrics.record_decoded(&topic, SchemaRole::Key);
                }
                Ok(Some(decoded))
            }
            Err(e) => {
                self.metrics.record_error(&topic, e.kind());
                Err(e)
            }
        }
    }

    /// Run the stage on the current task until `input` ends
    ///
    /// A transport error on `input` is forwarded once and ends the stage, as
    /// does a closed `output`.
    pub async fn pump(
        &self,
        mut input: mpsc::Receiver<AvroResult<KafkaMessage>>,
        output: mpsc::Sender<AvroResult<AvroMessage>>,
    ) {
        while let Some(received) = input.recv().await {
            let (forward, terminal) = match received {
                Ok(message) => match self.decode_message(message) {
                    Ok(Some(decoded)) => (Ok(decoded), false),
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("Failed to decode record: {}", e);
                        (Err(e), false)
                    }
                },
                Err(e) => {
                    error!("Kafka consumer error: {}", e);
                    (Err(e), true)
                }
            };

            if output.send(forward).await.is_err() {
                debug!("Decoded record receiver dropped, stopping consumer stage");
                return;
            }
            if terminal {
                return;
            }
        }

        info!("Kafka record stream ended, stopping consumer stage");
    }

    /// Spawn the stage on the tokio runtime and return its output
    pub fn spawn(
        &self,
        input: mpsc::Receiver<AvroResult<KafkaMessage>>,
    ) -> mpsc::Receiver<AvroResult<AvroMessage>> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let stage = self.clone();
        tokio::spawn(async move { stage.pump(input, tx).await });
        rx
    }
}
