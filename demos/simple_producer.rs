//! Simple Avro producer example
//!
//! Loads the latest schemas of one topic and sends a single record through `rdkafka`.
//!
//! Usage:
//!   SCHEMA_REGISTRY_URL=http://localhost:8081 \
//!   KAFKA_BROKERS=localhost:9092 \
//!   cargo run --example simple_producer --features rdkafka

use kafka_avro_core::kafka::RdKafkaTransport;
use kafka_avro_core::{
    init_tracing, AvroProducer, AvroResult, ClientConfig, Payload, SchemaContext,
    DEFAULT_PARTITION,
};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

const TOPIC: &str = "simple-producer-topic";

#[tokio::main]
async fn main() -> AvroResult<()> {
    let mut config = ClientConfig::from_env()?;
    if config.topics.is_empty() {
        config.topics = vec![TOPIC.to_string()];
    }
    config
        .kafka
        .entry("bootstrap.servers".to_string())
        .or_insert_with(|| "localhost:9092".to_string());
    config
        .kafka
        .insert("socket.nagle.disable".to_string(), "true".to_string());
    config.validate()?;

    init_tracing(&config.log_level);

    let context = SchemaContext::load_from_config(&config).await?;

    let transport = RdKafkaTransport::from_config(&config);
    let mut producer = AvroProducer::from_config(transport, context, &config);
    producer.connect().await?;

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .ok();

    producer
        .produce(
            &config.topics[0],
            DEFAULT_PARTITION,
            Some(Payload::from(json!({"cat": "dog"}))),
            Some(Payload::from("my-key")),
            timestamp,
            None,
        )
        .await?;
    println!("Record sent to {}", config.topics[0]);

    producer.disconnect().await
}
