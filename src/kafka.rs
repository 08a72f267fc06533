//! `rdkafka` transport for the producer and consumer adapters.
//!
//! Enabled with the `rdkafka` feature. Client properties (`bootstrap.servers`,
//! `group.id`, SASL settings, ...) are passed through verbatim.

use crate::config::ClientConfig;
use crate::message::KafkaMessage;
use crate::traits::{KafkaTransport, OutboundRecord};
use crate::{AvroError, AvroResult};
use async_trait::async_trait;
use rdkafka::config::ClientConfig as RdKafkaConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Default delivery timeout for sends and the final flush
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

fn client_config(properties: &BTreeMap<String, String>) -> RdKafkaConfig {
    let mut config = RdKafkaConfig::new();
    for (key, value) in properties {
        config.set(key, value);
    }
    config
}

/// [`KafkaTransport`] over an `rdkafka` `FutureProducer`
pub struct RdKafkaTransport {
    properties: BTreeMap<String, String>,
    producer: Option<FutureProducer>,
    delivery_timeout: Duration,
}

impl RdKafkaTransport {
    /// Create a transport; the producer is created on `connect`
    pub fn new(properties: BTreeMap<String, String>) -> Self {
        Self {
            properties,
            producer: None,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    /// Create a transport from the `kafka` properties of `config`
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.kafka.clone())
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }
}

#[async_trait]
impl KafkaTransport for RdKafkaTransport {
    async fn connect(&mut self) -> AvroResult<()> {
        if self.producer.is_some() {
            return Ok(());
        }

        if !self.properties.contains_key("bootstrap.servers") {
            return Err(AvroError::config("bootstrap.servers is required"));
        }

        let producer: FutureProducer = client_config(&self.properties)
            .create()
            .map_err(|e| AvroError::transport_with_source("Failed to create Kafka producer", e))?;

        info!(
            "Kafka producer created for {}",
            self.properties["bootstrap.servers"]
        );
        self.producer = Some(producer);
        Ok(())
    }

    async fn disconnect(&mut self) -> AvroResult<()> {
        if let Some(producer) = self.producer.take() {
            producer
                .flush(Timeout::After(self.delivery_timeout))
                .map_err(|e| AvroError::transport_with_source("Failed to flush Kafka producer", e))?;
            info!("Kafka producer flushed and closed");
        }
        Ok(())
    }

    async fn send(&self, record: OutboundRecord) -> AvroResult<()> {
        let producer = self
            .producer
            .as_ref()
            .ok_or_else(|| AvroError::transport("Kafka producer is not connected"))?;

        let mut future_record = FutureRecord::<[u8], [u8]>::to(&record.topic);
        if let Some(value) = record.value.as_deref() {
            future_record = future_record.payload(value);
        }
        if let Some(key) = record.key.as_deref() {
            future_record = future_record.key(key);
        }
        if record.partition >= 0 {
            future_record = future_record.partition(record.partition);
        }
        if let Some(timestamp) = record.timestamp {
            future_record = future_record.timestamp(timestamp);
        }

        let (partition, offset) = producer
            .send(future_record, Timeout::After(self.delivery_timeout))
            .await
            .map_err(|(e, _)| {
                AvroError::transport_with_source(
                    format!("Failed to deliver record to {}", record.topic),
                    e,
                )
            })?;

        debug!(
            topic = %record.topic,
            partition,
            offset,
            opaque = ?record.opaque,
            "record delivered"
        );
        Ok(())
    }
}

/// Create a `StreamConsumer` subscribed to `topics`
pub fn create_stream_consumer(
    properties: &BTreeMap<String, String>,
    topics: &[String],
) -> AvroResult<StreamConsumer> {
    let consumer: StreamConsumer = client_config(properties)
        .create()
        .map_err(|e| AvroError::transport_with_source("Failed to create Kafka consumer", e))?;

    let topics: Vec<&str> = topics.iter().map(String::as_str).collect();
    consumer
        .subscribe(&topics)
        .map_err(|e| AvroError::transport_with_source("Failed to subscribe to topics", e))?;

    info!("Kafka consumer subscribed to {:?}", topics);
    Ok(consumer)
}

/// Forward records of `consumer` into a channel for [`AvroConsumer::spawn`](crate::AvroConsumer::spawn)
///
/// The first consumer error is forwarded and ends the pump.
pub fn spawn_consumer_pump(
    consumer: Arc<StreamConsumer>,
    capacity: usize,
) -> mpsc::Receiver<AvroResult<KafkaMessage>> {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(async move {
        loop {
            let received = match consumer.recv().await {
                Ok(message) => Ok(to_kafka_message(&message)),
                Err(e) => Err(e),
            };

            match received {
                Ok(message) => {
                    if tx.send(Ok(message)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Kafka consumer error: {}", e);
                    let _ = tx
                        .send(Err(AvroError::transport_with_source("Kafka consumer error", e)))
                        .await;
                    break;
                }
            }
        }
    });

    rx
}

fn to_kafka_message(message: &BorrowedMessage<'_>) -> KafkaMessage {
    KafkaMessage {
        topic: message.topic().to_string(),
        partition: message.partition(),
        offset: message.offset(),
        timestamp: message.timestamp().to_millis(),
        key: message.key().map(<[u8]>::to_vec),
        value: message.payload().map(<[u8]>::to_vec),
    }
}
