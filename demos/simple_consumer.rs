//! Simple Avro consumer example
//!
//! Subscribes to one topic through `rdkafka` and prints every decoded record.
//!
//! Usage:
//!   SCHEMA_REGISTRY_URL=http://localhost:8081 \
//!   KAFKA_BROKERS=localhost:9092 \
//!   cargo run --example simple_consumer --features rdkafka

use kafka_avro_core::kafka::{create_stream_consumer, spawn_consumer_pump};
use kafka_avro_core::{
    init_tracing, AvroConsumer, AvroResult, ClientConfig, SchemaContext,
};
use std::sync::Arc;

const TOPIC: &str = "simple-consumer-topic";

#[tokio::main]
async fn main() -> AvroResult<()> {
    let mut config = ClientConfig::from_env()?;
    if config.topics.is_empty() {
        config.topics = vec![TOPIC.to_string()];
    }
    for (key, value) in [
        ("bootstrap.servers", "localhost:9092"),
        ("group.id", "my-group-id"),
        ("auto.offset.reset", "earliest"),
    ] {
        config
            .kafka
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }
    config.validate()?;

    init_tracing(&config.log_level);

    let context = SchemaContext::load_from_config(&config).await?;

    let consumer = Arc::new(create_stream_consumer(&config.kafka, &config.topics)?);
    let records = spawn_consumer_pump(consumer, config.channel_capacity);

    let mut decoded = AvroConsumer::from_config(context, &config).spawn(records);
    while let Some(result) = decoded.recv().await {
        match result {
            Ok(message) => {
                println!("Received Message! (Offset: {})", message.offset());
                println!("Value: {:?}", message.value());
                println!("Key: {:?}", message.key());
            }
            Err(e) => eprintln!("Failed to decode record: {}", e),
        }
    }

    Ok(())
}
