//! Producer and consumer adapters around an external Kafka client.
//!
//! - `AvroProducer`: encodes records with the loaded schemas, then delegates the send
//! - `AvroConsumer`: decodes received records, as a call or as a channel stage
//!
//! Both share a `SchemaContext`, the read-only catalogs loaded at startup.

mod consumer;
mod context;
mod producer;

pub use consumer::AvroConsumer;
pub use context::SchemaContext;
pub use producer::AvroProducer;

/// Initialize tracing/logging
///
/// `RUST_LOG` wins over `log_level`. Calling this more than once is harmless.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok(); // Ignore if already initialized
}
