//! Configuration for registry access and the producer/consumer adapters.

use crate::schema::VersionSelector;
use crate::wire::{parse_magic_byte, DEFAULT_MAGIC_BYTE};
use crate::{AvroError, AvroResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::env;

/// Main configuration for Avro producers and consumers
///
/// # Structure
/// - **Mandatory fields** (from environment): `schema_registry_url`
/// - **Optional fields** (from config file, environment or defaults): everything else
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Schema registry base URL (mandatory, from SCHEMA_REGISTRY_URL env var)
    pub schema_registry_url: String,

    /// Name used to label metrics
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Topics whose schemas are loaded at startup
    #[serde(default)]
    pub topics: Vec<String>,

    /// Which schema versions to load per subject
    #[serde(default)]
    pub schema_version: VersionSelector,

    /// Marker byte of framed records, as a number or a hex string
    #[serde(
        default = "default_magic_byte",
        deserialize_with = "deserialize_magic_byte"
    )]
    pub magic_byte: u8,

    /// Send raw bytes / JSON text when Avro encoding fails
    #[serde(default)]
    pub fallback: bool,

    /// Capacity of the consumer stage's output channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Properties passed to the Kafka client verbatim (`bootstrap.servers`, `group.id`, ...)
    #[serde(default)]
    pub kafka: BTreeMap<String, String>,
}

fn default_client_name() -> String {
    "kafka-avro".to_string()
}
fn default_magic_byte() -> u8 {
    DEFAULT_MAGIC_BYTE
}
fn default_channel_capacity() -> usize {
    100
}
fn default_log_level() -> String {
    "info".to_string()
}

fn deserialize_magic_byte<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u8),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(byte) => Ok(byte),
        Repr::Text(text) => parse_magic_byte(&text).map_err(serde::de::Error::custom),
    }
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the registry URL
    pub fn new(schema_registry_url: impl Into<String>) -> Self {
        Self {
            schema_registry_url: schema_registry_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    ///
    /// - `SCHEMA_REGISTRY_URL`: registry URL (required)
    /// - `KAFKA_AVRO_TOPICS`: comma-separated topics
    /// - `KAFKA_AVRO_SCHEMA_VERSION`: `latest`, `all` or a version number
    /// - `KAFKA_AVRO_MAGIC_BYTE`: hex marker byte
    /// - `KAFKA_AVRO_FALLBACK`: `true` / `false`
    /// - `KAFKA_AVRO_CLIENT_NAME`: metrics label
    /// - `KAFKA_BROKERS`: `bootstrap.servers` for the Kafka client
    pub fn from_env() -> AvroResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AvroResult<Self> {
        let schema_registry_url = lookup("SCHEMA_REGISTRY_URL")
            .ok_or_else(|| AvroError::config("SCHEMA_REGISTRY_URL is required"))?;

        let mut config = Self::new(schema_registry_url);
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> AvroResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AvroError::config(format!("Failed to read config file {}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            AvroError::config(format!("Failed to parse config file {}: {}", path, e))
        })
    }

    /// Let environment variables override values from a file
    pub fn apply_env_overrides(&mut self) -> AvroResult<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> AvroResult<()> {
        if let Some(url) = lookup("SCHEMA_REGISTRY_URL") {
            self.schema_registry_url = url;
        }
        if let Some(name) = lookup("KAFKA_AVRO_CLIENT_NAME") {
            self.client_name = name;
        }
        if let Some(topics) = lookup("KAFKA_AVRO_TOPICS") {
            self.topics = topics
                .split(',')
                .map(str::trim)
                .filter(|topic| !topic.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(version) = lookup("KAFKA_AVRO_SCHEMA_VERSION") {
            self.schema_version = version.parse().map_err(|e| {
                AvroError::config(format!("Invalid KAFKA_AVRO_SCHEMA_VERSION: {}", e))
            })?;
        }
        if let Some(magic) = lookup("KAFKA_AVRO_MAGIC_BYTE") {
            self.magic_byte = parse_magic_byte(&magic)
                .map_err(|e| AvroError::config(format!("Invalid KAFKA_AVRO_MAGIC_BYTE: {}", e)))?;
        }
        if let Some(fallback) = lookup("KAFKA_AVRO_FALLBACK") {
            self.fallback = fallback.trim().parse().map_err(|_| {
                AvroError::config(format!(
                    "Invalid KAFKA_AVRO_FALLBACK '{}': expected true or false",
                    fallback
                ))
            })?;
        }
        if let Some(brokers) = lookup("KAFKA_BROKERS") {
            self.kafka.insert("bootstrap.servers".to_string(), brokers);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> AvroResult<()> {
        if self.schema_registry_url.is_empty() {
            return Err(AvroError::config("schema_registry_url cannot be empty"));
        }

        if !self.schema_registry_url.starts_with("http://")
            && !self.schema_registry_url.starts_with("https://")
        {
            return Err(AvroError::config(format!(
                "schema_registry_url must use http or https: {}",
                self.schema_registry_url
            )));
        }

        if self.topics.iter().any(|topic| topic.trim().is_empty()) {
            return Err(AvroError::config("topic names cannot be empty"));
        }

        if self.channel_capacity == 0 {
            return Err(AvroError::config("channel_capacity must be > 0"));
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            schema_registry_url: "http://localhost:8081".to_string(),
            client_name: default_client_name(),
            topics: Vec::new(),
            schema_version: VersionSelector::Latest,
            magic_byte: DEFAULT_MAGIC_BYTE,
            fallback: false,
            channel_capacity: default_channel_capacity(),
            log_level: default_log_level(),
            kafka: BTreeMap::new(),
        }
    }
}
