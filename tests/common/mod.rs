//! Shared test doubles: an in-memory schema registry and a recording transport.

#![allow(dead_code)]

use async_trait::async_trait;
use kafka_avro_core::{
    AvroResult, HttpFetch, HttpResponse, KafkaTransport, OutboundRecord, SchemaRegistryClient,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const REGISTRY_URL: &str = "http://mock-schema-registry:1234";

pub const NAME_SCHEMA: &str =
    r#"{"type": "record", "name": "Pet", "fields": [{"name": "name", "type": "string"}]}"#;
pub const MY_NAME_SCHEMA: &str =
    r#"{"type": "record", "name": "Pet", "fields": [{"name": "myName", "type": "string"}]}"#;
pub const AGE_SCHEMA: &str =
    r#"{"type": "record", "name": "Pet", "fields": [{"name": "age", "type": "int"}]}"#;
pub const STRING_SCHEMA: &str = r#""string""#;

/// In-memory schema registry keyed by request path
#[derive(Default)]
pub struct MockRegistry {
    routes: HashMap<String, (u16, String)>,
    requests: Mutex<Vec<String>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `GET /subjects/{subject}/versions/{segment}` with a schema envelope
    pub fn schema(mut self, subject: &str, segment: &str, id: i32, version: u32, schema: &str) -> Self {
        let body = json!({
            "id": id,
            "subject": subject,
            "version": version,
            "schema": schema,
        });
        self.routes.insert(
            format!("/subjects/{}/versions/{}", subject, segment),
            (200, body.to_string()),
        );
        self
    }

    /// Answer `GET /subjects/{subject}/versions` with a version list
    pub fn versions(mut self, subject: &str, versions: &[u32]) -> Self {
        self.routes.insert(
            format!("/subjects/{}/versions", subject),
            (200, json!(versions).to_string()),
        );
        self
    }

    /// Answer `path` with a bare status
    pub fn status(mut self, path: &str, status: u16) -> Self {
        self.routes.insert(path.to_string(), (status, String::new()));
        self
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetch for MockRegistry {
    async fn get(&self, url: &str) -> AvroResult<HttpResponse> {
        let path = url.strip_prefix(REGISTRY_URL).unwrap_or(url).to_string();
        self.requests.lock().unwrap().push(path.clone());

        Ok(match self.routes.get(&path) {
            Some((status, body)) => HttpResponse::new(*status, path, body.as_bytes()),
            None => HttpResponse::new(
                404,
                path,
                r#"{"error_code":40401,"message":"Subject not found."}"#.as_bytes(),
            ),
        })
    }
}

/// Registry contents used by most loading tests
pub fn success_topic_registry() -> MockRegistry {
    MockRegistry::new()
        .schema("success-topic-value", "latest", 263, 2, NAME_SCHEMA)
        .schema("success-topic-value", "2", 263, 2, NAME_SCHEMA)
        .schema("success-topic-value", "1", 262, 1, MY_NAME_SCHEMA)
        .status("/subjects/success-topic-value/versions/3", 404)
        .versions("success-topic-value", &[1, 2])
        .schema("success-topic-key", "latest", 3, 1, STRING_SCHEMA)
        .schema("success-topic-key", "1", 3, 1, STRING_SCHEMA)
        .versions("success-topic-key", &[1])
        .status("/subjects/success-bad-response-topic-value/versions/latest", 204)
        .status("/subjects/success-bad-response-topic-value/versions", 204)
}

/// Client over a shared mock so tests can inspect requests afterwards
pub fn client(registry: Arc<MockRegistry>) -> SchemaRegistryClient<Arc<MockRegistry>> {
    SchemaRegistryClient::with_fetcher(format!("{}/", REGISTRY_URL), registry)
}

/// Transport that keeps every record it is asked to send
#[derive(Default)]
pub struct RecordingTransport {
    pub connected: bool,
    pub sent: Mutex<Vec<OutboundRecord>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<OutboundRecord> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl KafkaTransport for RecordingTransport {
    async fn connect(&mut self) -> AvroResult<()> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> AvroResult<()> {
        self.connected = false;
        Ok(())
    }

    async fn send(&self, record: OutboundRecord) -> AvroResult<()> {
        self.sent.lock().unwrap().push(record);
        Ok(())
    }
}
