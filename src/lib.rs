//! # Kafka Avro Core
//!
//! Avro encoding for Kafka records with schemas resolved through a Confluent
//! schema registry.
//!
//! Records travel in the Confluent wire format: one magic byte, the schema id as
//! a big-endian `i32`, then the Avro binary payload. Schemas are loaded from the
//! registry ahead of time into per-topic catalogs (one for keys, one for values),
//! and every encode or decode picks its schema from those catalogs.
//!
//! ## Overview
//!
//! - [`SchemaRegistry`] loads `latest`, `all` or one explicit version of the
//!   `{topic}-key` and `{topic}-value` subjects
//! - [`AvroProducer`] encodes records with the newest schema that accepts them and
//!   hands them to a [`KafkaTransport`]
//! - [`AvroConsumer`] decodes received records back into `serde_json::Value`s,
//!   together with the schema id that decoded them
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kafka_avro_core::{
//!     AvroConsumer, AvroResult, KafkaMessage, SchemaContext, SchemaRegistry, VersionSelector,
//! };
//!
//! # async fn run() -> AvroResult<()> {
//! let registry = SchemaRegistry::new("http://localhost:8081", ["pets"], VersionSelector::Latest)?;
//! let context = SchemaContext::load(&registry).await?;
//!
//! let consumer = AvroConsumer::new(context);
//! let raw = KafkaMessage::new("pets", 0, 42).with_value(vec![0, 0, 0, 1, 7, 10]);
//! if let Some(message) = consumer.decode_message(raw)? {
//!     println!("{:?} (schema {:?})", message.value(), message.value_schema_id());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Schema resolution**: direct lookup by embedded schema id, with a scan over
//!   every loaded schema as fallback
//! - **Fallback**: optionally send raw bytes or JSON text when a record cannot be encoded
//! - **Observability**: structured logging with `tracing`, counters with `metrics`
//! - **Configuration**: environment variables and TOML files
//! - **`rdkafka` feature**: a ready-made transport over `rdkafka`

mod avro;
mod catalog;
mod config;
mod error;
mod message;
mod metrics;
mod registry;
mod resolver;
mod runtime;
mod schema;
mod traits;
pub mod utils;
pub mod wire;

#[cfg(feature = "rdkafka")]
pub mod kafka;

// Re-export public API
pub use avro::{decode_avro, encode_avro, is_empty_value, CompiledSchema};
pub use catalog::{load_catalog, load_schemas, Catalog, SchemaRecord, SchemaRegistry, TopicSchemas};
pub use config::ClientConfig;
pub use error::{AvroError, AvroResult};
pub use message::{AvroMessage, KafkaMessage, Payload, ProducerRecord, DEFAULT_PARTITION};
pub use self::metrics::CodecMetrics;
pub use registry::{HttpFetch, HttpResponse, ReqwestFetcher, SchemaRegistryClient};
pub use resolver::{decode_chunk, encode_chunk, DecodedChunk};
pub use runtime::{init_tracing, AvroConsumer, AvroProducer, SchemaContext};
pub use schema::{SchemaRole, VersionSelector};
pub use traits::{KafkaTransport, OutboundRecord};
pub use wire::{encode_wire_format, DEFAULT_MAGIC_BYTE, MAX_ENVELOPE_SIZE};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
