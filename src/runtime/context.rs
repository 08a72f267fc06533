//! Shared, read-only view of the loaded schema catalogs

use crate::catalog::{SchemaRegistry, TopicSchemas};
use crate::config::ClientConfig;
use crate::registry::HttpFetch;
use crate::wire::DEFAULT_MAGIC_BYTE;
use crate::AvroResult;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Loaded catalogs plus the magic byte used to frame records
///
/// Cloning shares the catalogs. They are never mutated once loaded; to pick up
/// new registry versions, load a new context and hand it to new adapters.
#[derive(Debug, Clone)]
pub struct SchemaContext {
    schemas: Arc<HashMap<String, TopicSchemas>>,
    magic_byte: u8,
}

impl SchemaContext {
    /// Wrap catalogs loaded elsewhere
    pub fn new(schemas: HashMap<String, TopicSchemas>) -> Self {
        Self {
            schemas: Arc::new(schemas),
            magic_byte: DEFAULT_MAGIC_BYTE,
        }
    }

    /// Load every topic of `registry`
    pub async fn load<F: HttpFetch>(registry: &SchemaRegistry<F>) -> AvroResult<Self> {
        let schemas = registry.load().await?;
        info!(
            "Schema context ready for {} topic(s) from {}",
            schemas.len(),
            registry.client().endpoint()
        );
        Ok(Self::new(schemas))
    }

    /// Load the topics of `config` from its registry, framing with its magic byte
    pub async fn load_from_config(config: &ClientConfig) -> AvroResult<Self> {
        let registry = SchemaRegistry::from_config(config)?;
        Ok(Self::load(&registry).await?.with_magic_byte(config.magic_byte))
    }

    /// Use a non-default magic byte
    pub fn with_magic_byte(mut self, magic_byte: u8) -> Self {
        self.magic_byte = magic_byte;
        self
    }

    pub fn magic_byte(&self) -> u8 {
        self.magic_byte
    }

    /// Catalogs of `topic`, if it was loaded
    pub fn topic(&self, topic: &str) -> Option<&TopicSchemas> {
        self.schemas.get(topic)
    }

    /// Loaded topic names
    pub fn topics(&self) -> impl Iterator<Item = &str> + '_ {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
