//! Schema catalogs: per topic and role, every loaded schema keyed by schema id.

use crate::avro::CompiledSchema;
use crate::config::ClientConfig;
use crate::registry::{HttpFetch, ReqwestFetcher, SchemaRegistryClient};
use crate::schema::{SchemaRole, VersionSelector};
use crate::{AvroError, AvroResult};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, info};

/// One schema as assigned by the registry
#[derive(Debug, Clone)]
pub struct SchemaRecord {
    /// Registry-global schema id
    pub schema_id: i32,
    /// Version of the schema within its subject
    pub version: u32,
    /// Subject the schema was loaded from
    pub subject: String,
    /// Executable schema
    pub schema: CompiledSchema,
}

/// Loaded schemas of one topic and role, keyed by schema id
///
/// Iteration is always highest schema id first. Built once by a load and
/// read-only afterwards; reloading produces a new catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    topic: String,
    role: SchemaRole,
    entries: BTreeMap<i32, SchemaRecord>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new(topic: impl Into<String>, role: SchemaRole) -> Self {
        Self {
            topic: topic.into(),
            role,
            entries: BTreeMap::new(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn role(&self) -> SchemaRole {
        self.role
    }

    /// Add a record, replacing any record with the same schema id
    pub fn insert(&mut self, record: SchemaRecord) -> Option<SchemaRecord> {
        self.entries.insert(record.schema_id, record)
    }

    pub fn get(&self, schema_id: i32) -> Option<&SchemaRecord> {
        self.entries.get(&schema_id)
    }

    pub fn contains(&self, schema_id: i32) -> bool {
        self.entries.contains_key(&schema_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schema ids, highest first
    pub fn schema_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries.keys().rev().copied()
    }

    /// Records, highest schema id first
    pub fn records(&self) -> impl Iterator<Item = &SchemaRecord> + '_ {
        self.entries.values().rev()
    }

    /// Record with the highest schema id
    pub fn newest(&self) -> Option<&SchemaRecord> {
        self.entries.values().next_back()
    }

    pub(crate) fn no_schema(&self) -> AvroError {
        AvroError::NoSchema {
            topic: self.topic.clone(),
            role: self.role.to_string(),
        }
    }
}

/// Value and key catalogs of one topic
#[derive(Debug, Clone)]
pub struct TopicSchemas {
    pub value: Catalog,
    pub key: Catalog,
}

impl TopicSchemas {
    /// Empty catalogs for both roles
    pub fn new(topic: impl Into<String>) -> Self {
        let topic = topic.into();
        Self {
            value: Catalog::new(topic.clone(), SchemaRole::Value),
            key: Catalog::new(topic, SchemaRole::Key),
        }
    }

    /// Catalog for `role`
    pub fn catalog(&self, role: SchemaRole) -> &Catalog {
        match role {
            SchemaRole::Value => &self.value,
            SchemaRole::Key => &self.key,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.key.is_empty()
    }
}

/// Load the catalog of one topic and role
///
/// With `All`, versions are fetched newest first and one at a time. Any failed
/// fetch fails the whole load.
pub async fn load_catalog<F: HttpFetch>(
    client: &SchemaRegistryClient<F>,
    topic: &str,
    selector: VersionSelector,
    role: SchemaRole,
) -> AvroResult<Catalog> {
    let mut catalog = Catalog::new(topic, role);

    match selector {
        VersionSelector::All => {
            let mut versions = client.fetch_schema_versions(topic, role).await?;
            versions.sort_unstable_by(|a, b| b.cmp(a));
            debug!(topic = %topic, role = %role, ?versions, "loading all schema versions");

            for version in versions {
                let record = client
                    .fetch_schema(topic, VersionSelector::Version(version), role)
                    .await?;
                catalog.insert(record);
            }
        }
        single => {
            let record = client.fetch_schema(topic, single, role).await?;
            catalog.insert(record);
        }
    }

    Ok(catalog)
}

/// Load value and key catalogs for every topic
///
/// Roles of a topic are loaded concurrently, topics one after another. The
/// first failure fails the whole request.
pub async fn load_schemas<F, I, S>(
    client: &SchemaRegistryClient<F>,
    topics: I,
    selector: VersionSelector,
) -> AvroResult<HashMap<String, TopicSchemas>>
where
    F: HttpFetch,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut schemas = HashMap::new();

    for topic in topics {
        let topic = topic.as_ref();
        let start = Instant::now();

        let (value, key) = tokio::try_join!(
            load_catalog(client, topic, selector, SchemaRole::Value),
            load_catalog(client, topic, selector, SchemaRole::Key),
        )?;

        client.metrics().record_catalog_load(topic, start.elapsed());
        info!(
            topic = %topic,
            value_schemas = value.len(),
            key_schemas = key.len(),
            "Schemas loaded"
        );

        schemas.insert(topic.to_string(), TopicSchemas { value, key });
    }

    Ok(schemas)
}

/// Registry endpoint plus the topics and versions to load from it
#[derive(Debug, Clone)]
pub struct SchemaRegistry<F = ReqwestFetcher> {
    client: SchemaRegistryClient<F>,
    topics: Vec<String>,
    selector: VersionSelector,
}

impl SchemaRegistry<ReqwestFetcher> {
    /// Loader for `topics` at `endpoint`, using `reqwest`
    pub fn new<I, S>(endpoint: &str, topics: I, selector: VersionSelector) -> AvroResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::with_client(
            SchemaRegistryClient::new(endpoint)?,
            topics,
            selector,
        ))
    }

    /// Loader for the registry, topics and version selector of `config`
    pub fn from_config(config: &ClientConfig) -> AvroResult<Self> {
        Self::new(
            &config.schema_registry_url,
            config.topics.iter().cloned(),
            config.schema_version,
        )
    }
}

impl<F: HttpFetch> SchemaRegistry<F> {
    /// Loader over an existing client
    pub fn with_client<I, S>(client: SchemaRegistryClient<F>, topics: I, selector: VersionSelector) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client,
            topics: topics.into_iter().map(Into::into).collect(),
            selector,
        }
    }

    pub fn client(&self) -> &SchemaRegistryClient<F> {
        &self.client
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn selector(&self) -> VersionSelector {
        self.selector
    }

    /// Load value and key catalogs for every configured topic
    pub async fn load(&self) -> AvroResult<HashMap<String, TopicSchemas>> {
        if self.topics.is_empty() {
            return Err(AvroError::config("At least one topic is required to load schemas"));
        }
        load_schemas(&self.client, &self.topics, self.selector).await
    }
}
