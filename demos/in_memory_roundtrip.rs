//! In-memory round trip example
//!
//! Builds schema catalogs by hand, encodes a record through a transport that
//! only collects what it is given, and decodes it again. Needs neither a broker
//! nor a schema registry.
//!
//! Usage:
//!   cargo run --example in_memory_roundtrip

use async_trait::async_trait;
use kafka_avro_core::{
    init_tracing, AvroConsumer, AvroProducer, AvroResult, CompiledSchema, KafkaMessage,
    KafkaTransport, OutboundRecord, ProducerRecord, SchemaContext, SchemaRecord, TopicSchemas,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

const PET_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Pet",
    "fields": [
        {"name": "kind", "type": {"type": "enum", "name": "Kind", "symbols": ["CAT", "DOG"]}},
        {"name": "name", "type": "string"},
        {"name": "nickname", "type": ["null", "string"], "default": null}
    ]
}"#;

/// Keeps sent records in memory
#[derive(Default)]
struct MemoryTransport {
    log: Mutex<Vec<OutboundRecord>>,
}

#[async_trait]
impl KafkaTransport for MemoryTransport {
    async fn connect(&mut self) -> AvroResult<()> {
        Ok(())
    }

    async fn disconnect(&mut self) -> AvroResult<()> {
        Ok(())
    }

    async fn send(&self, record: OutboundRecord) -> AvroResult<()> {
        if let Ok(mut log) = self.log.lock() {
            log.push(record);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("debug");

    let mut pets = TopicSchemas::new("pets");
    pets.value.insert(SchemaRecord {
        schema_id: 1,
        version: 1,
        subject: "pets-value".to_string(),
        schema: CompiledSchema::parse(PET_SCHEMA)?,
    });
    pets.key.insert(SchemaRecord {
        schema_id: 2,
        version: 1,
        subject: "pets-key".to_string(),
        schema: CompiledSchema::parse(r#""string""#)?,
    });

    let mut schemas = HashMap::new();
    schemas.insert("pets".to_string(), pets);
    let context = SchemaContext::new(schemas);

    let producer = AvroProducer::new(MemoryTransport::default(), context.clone());
    producer
        .produce_record(
            ProducerRecord::new("pets", json!({"kind": "DOG", "name": "Kiara"})).with_key("pet-1"),
        )
        .await?;

    let sent = producer
        .transport()
        .log
        .lock()
        .map(|log| log.clone())
        .unwrap_or_default();

    let consumer = AvroConsumer::new(context);
    for (offset, record) in sent.into_iter().enumerate() {
        println!("Encoded value: {:02x?}", record.value.as_deref().unwrap_or_default());

        let mut message = KafkaMessage::new(record.topic, 0, offset as i64);
        message.key = record.key;
        message.value = record.value;

        if let Some(decoded) = consumer.decode_message(message)? {
            println!(
                "Decoded value {} with schema {:?}, key {:?}",
                decoded.value().cloned().unwrap_or_default(),
                decoded.value_schema_id(),
                decoded.key()
            );
        }
    }

    Ok(())
}
