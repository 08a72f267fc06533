//! Metrics for the codec, registry and adapters.

use crate::schema::SchemaRole;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Metrics collector for producer/consumer adapters and the registry loader
///
/// Recording is a no-op until the application installs a `metrics` recorder.
#[derive(Debug, Clone)]
pub struct CodecMetrics {
    /// Client name for labeling
    client_name: String,
}

impl CodecMetrics {
    /// Create a new metrics collector
    pub fn new(client_name: impl Into<String>) -> Self {
        Self::register_metrics();

        Self {
            client_name: client_name.into(),
        }
    }

    /// Register metric descriptions
    fn register_metrics() {
        describe_counter!(
            "kafka_avro_records_encoded_total",
            "Total number of key/value chunks encoded to the wire format"
        );
        describe_counter!(
            "kafka_avro_records_decoded_total",
            "Total number of key/value chunks decoded from the wire format"
        );
        describe_counter!(
            "kafka_avro_fallback_total",
            "Total number of chunks sent as raw bytes or JSON text after an encode failure"
        );
        describe_counter!(
            "kafka_avro_failures_total",
            "Total number of encode/decode failures"
        );
        describe_counter!(
            "kafka_avro_dropped_unknown_topic_total",
            "Total number of consumed records dropped because their topic has no schemas"
        );
        describe_counter!(
            "kafka_avro_registry_fetches_total",
            "Total number of schema registry requests"
        );
        describe_histogram!(
            "kafka_avro_catalog_load_duration_seconds",
            "Time spent loading the schema catalogs of one topic"
        );
    }

    /// Record a chunk encoded
    pub fn record_encoded(&self, topic: &str, role: SchemaRole) {
        counter!(
            "kafka_avro_records_encoded_total",
            "client" => self.client_name.clone(),
            "topic" => topic.to_string(),
            "role" => role.as_str(),
        )
        .increment(1);
    }

    /// Record a chunk decoded
    pub fn record_decoded(&self, topic: &str, role: SchemaRole) {
        counter!(
            "kafka_avro_records_decoded_total",
            "client" => self.client_name.clone(),
            "topic" => topic.to_string(),
            "role" => role.as_str(),
        )
        .increment(1);
    }

    /// Record a fallback substitution
    pub fn record_fallback(&self, topic: &str, role: SchemaRole) {
        counter!(
            "kafka_avro_fallback_total",
            "client" => self.client_name.clone(),
            "topic" => topic.to_string(),
            "role" => role.as_str(),
        )
        .increment(1);
    }

    /// Record an encode or decode failure
    pub fn record_error(&self, topic: &str, error_type: &str) {
        counter!(
            "kafka_avro_failures_total",
            "client" => self.client_name.clone(),
            "topic" => topic.to_string(),
            "error_type" => error_type.to_string(),
        )
        .increment(1);
    }

    /// Record a consumed record dropped for lack of schemas
    pub fn record_dropped(&self, topic: &str) {
        counter!(
            "kafka_avro_dropped_unknown_topic_total",
            "client" => self.client_name.clone(),
            "topic" => topic.to_string(),
        )
        .increment(1);
    }

    /// Record a registry request and its outcome
    pub fn record_registry_fetch(&self, subject: &str, success: bool) {
        counter!(
            "kafka_avro_registry_fetches_total",
            "client" => self.client_name.clone(),
            "subject" => subject.to_string(),
            "outcome" => if success { "success" } else { "failure" },
        )
        .increment(1);
    }

    /// Record how long a topic's catalogs took to load
    pub fn record_catalog_load(&self, topic: &str, duration: Duration) {
        histogram!(
            "kafka_avro_catalog_load_duration_seconds",
            "client" => self.client_name.clone(),
            "topic" => topic.to_string(),
        )
        .record(duration.as_secs_f64());
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new("kafka-avro")
    }
}
