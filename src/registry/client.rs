//! Schema registry client: resolves subjects and versions to compiled schemas.

use super::fetch::{HttpFetch, HttpResponse, ReqwestFetcher};
use crate::avro::CompiledSchema;
use crate::catalog::SchemaRecord;
use crate::metrics::CodecMetrics;
use crate::schema::{SchemaRole, VersionSelector};
use crate::{AvroError, AvroResult};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Registry envelope for `GET /subjects/{subject}/versions/{version}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectVersion {
    id: i32,
    subject: String,
    version: u32,
    schema: String,
    #[serde(default)]
    schema_type: Option<String>,
}

/// Client for the subject/version endpoints of a Confluent schema registry
///
/// Failures are never retried here; retry policy belongs to the [`HttpFetch`]
/// implementation.
#[derive(Debug, Clone)]
pub struct SchemaRegistryClient<F = ReqwestFetcher> {
    endpoint: String,
    fetcher: F,
    metrics: CodecMetrics,
}

impl SchemaRegistryClient<ReqwestFetcher> {
    /// Create a client for `endpoint` using a default `reqwest` fetcher
    pub fn new(endpoint: impl Into<String>) -> AvroResult<Self> {
        Ok(Self::with_fetcher(endpoint, ReqwestFetcher::new()?))
    }
}

impl<F: HttpFetch> SchemaRegistryClient<F> {
    /// Create a client that issues its requests through `fetcher`
    pub fn with_fetcher(endpoint: impl Into<String>, fetcher: F) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            fetcher,
            metrics: CodecMetrics::default(),
        }
    }

    /// Use a dedicated metrics collector
    pub fn with_metrics(mut self, metrics: CodecMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Registry base URL, without trailing slash
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn metrics(&self) -> &CodecMetrics {
        &self.metrics
    }

    /// Fetch and compile one version of the `{topic}-{role}` subject
    ///
    /// `version` must be `Latest` or an explicit number; listing every version
    /// is done with [`fetch_schema_versions`](Self::fetch_schema_versions).
    pub async fn fetch_schema(
        &self,
        topic: &str,
        version: VersionSelector,
        role: SchemaRole,
    ) -> AvroResult<SchemaRecord> {
        let subject = role.subject(topic);
        let segment = version.path_segment().ok_or_else(|| {
            AvroError::validation(format!(
                "Version selector '{}' does not name a single schema of subject '{}'",
                version, subject
            ))
        })?;
        let url = format!("{}/subjects/{}/versions/{}", self.endpoint, subject, segment);

        debug!(subject = %subject, version = %segment, "fetching schema");
        let response = self.request(&subject, &segment, role, &url).await?;

        let envelope: SubjectVersion = serde_json::from_slice(&response.body).map_err(|e| {
            response_error(
                &subject,
                &segment,
                role,
                format!("Malformed registry response: {}", e),
                &response,
            )
        })?;

        if let Some(schema_type) = envelope.schema_type.as_deref() {
            if !schema_type.eq_ignore_ascii_case("AVRO") {
                return Err(AvroError::SchemaCompile {
                    subject,
                    version: segment,
                    message: format!("Unsupported schema type: {}", schema_type),
                });
            }
        }

        let schema =
            CompiledSchema::parse(&envelope.schema).map_err(|e| AvroError::SchemaCompile {
                subject: subject.clone(),
                version: segment.clone(),
                message: e.to_string(),
            })?;

        info!(
            subject = %envelope.subject,
            schema_id = envelope.id,
            version = envelope.version,
            "Loaded schema"
        );

        Ok(SchemaRecord {
            schema_id: envelope.id,
            version: envelope.version,
            subject: envelope.subject,
            schema,
        })
    }

    /// List the version numbers the registry knows for `{topic}-{role}`
    ///
    /// The registry gives no ordering guarantee; callers sort.
    pub async fn fetch_schema_versions(
        &self,
        topic: &str,
        role: SchemaRole,
    ) -> AvroResult<Vec<u32>> {
        let subject = role.subject(topic);
        let url = format!("{}/subjects/{}/versions", self.endpoint, subject);

        debug!(subject = %subject, "fetching schema versions");
        let response = self.request(&subject, "all", role, &url).await?;

        let versions: Vec<u32> = serde_json::from_slice(&response.body).map_err(|e| {
            response_error(
                &subject,
                "all",
                role,
                format!("Malformed version list: {}", e),
                &response,
            )
        })?;

        if versions.is_empty() {
            warn!(subject = %subject, "Registry lists no versions");
        }

        Ok(versions)
    }

    /// GET `url`, accepting only a 200 with a body
    async fn request(
        &self,
        subject: &str,
        version: &str,
        role: SchemaRole,
        url: &str,
    ) -> AvroResult<HttpResponse> {
        let response = match self.fetcher.get(url).await {
            Ok(response) => response,
            Err(e) => {
                self.metrics.record_registry_fetch(subject, false);
                return Err(e);
            }
        };

        if response.status != 200 || response.body.is_empty() {
            self.metrics.record_registry_fetch(subject, false);
            warn!(
                subject = %subject,
                version = %version,
                status = response.status,
                "Schema fetch failed"
            );
            return Err(response_error(
                subject,
                version,
                role,
                "Schema fetch failed".to_string(),
                &response,
            ));
        }

        self.metrics.record_registry_fetch(subject, true);
        Ok(response)
    }
}

fn response_error(
    subject: &str,
    version: &str,
    role: SchemaRole,
    message: String,
    response: &HttpResponse,
) -> AvroError {
    AvroError::RegistryResponse {
        subject: subject.to_string(),
        version: version.to_string(),
        role: role.to_string(),
        message,
        status: response.status,
        method: response.method.clone(),
        path: response.path.clone(),
        body: response.text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers by URL and remembers what was asked
    #[derive(Default)]
    struct StubFetcher {
        responses: HashMap<String, (u16, String)>,
        requested: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn with(mut self, url: &str, status: u16, body: &str) -> Self {
            self.responses
                .insert(url.to_string(), (status, body.to_string()));
            self
        }
    }

    #[async_trait]
    impl HttpFetch for StubFetcher {
        async fn get(&self, url: &str) -> AvroResult<HttpResponse> {
            self.requested.lock().unwrap().push(url.to_string());
            let path = url.trim_start_matches("http://registry");
            match self.responses.get(url) {
                Some((status, body)) => Ok(HttpResponse::new(*status, path, body.as_bytes())),
                None => Ok(HttpResponse::new(404, path, r#"{"error_code":40401}"#.as_bytes())),
            }
        }
    }

    fn envelope(id: i32, version: u32, schema: &str) -> String {
        serde_json::json!({
            "id": id,
            "subject": "orders-value",
            "version": version,
            "schema": schema,
        })
        .to_string()
    }

    const NAME_SCHEMA: &str =
        r#"{"type":"record","name":"Pet","fields":[{"name":"name","type":"string"}]}"#;

    #[tokio::test]
    async fn test_fetch_latest_strips_trailing_slash() {
        let fetcher = StubFetcher::default().with(
            "http://registry/subjects/orders-value/versions/latest",
            200,
            &envelope(263, 2, NAME_SCHEMA),
        );
        let client = SchemaRegistryClient::with_fetcher("http://registry/", fetcher);

        let record = client
            .fetch_schema("orders", VersionSelector::Latest, SchemaRole::Value)
            .await
            .unwrap();

        assert_eq!(client.endpoint(), "http://registry");
        assert_eq!(record.schema_id, 263);
        assert_eq!(record.version, 2);
        assert_eq!(record.subject, "orders-value");
    }

    #[tokio::test]
    async fn test_fetch_explicit_version() {
        let fetcher = StubFetcher::default().with(
            "http://registry/subjects/orders-key/versions/1",
            200,
            &envelope(261, 1, r#""string""#),
        );
        let client = SchemaRegistryClient::with_fetcher("http://registry", fetcher);

        let record = client
            .fetch_schema("orders", VersionSelector::Version(1), SchemaRole::Key)
            .await
            .unwrap();
        assert_eq!(record.schema_id, 261);
    }

    #[tokio::test]
    async fn test_missing_subject_is_registry_error() {
        let client = SchemaRegistryClient::with_fetcher("http://registry", StubFetcher::default());

        let err = client
            .fetch_schema("ghost", VersionSelector::Latest, SchemaRole::Value)
            .await
            .unwrap_err();

        match err {
            AvroError::RegistryResponse {
                subject,
                version,
                role,
                status,
                method,
                path,
                body,
                ..
            } => {
                assert_eq!(subject, "ghost-value");
                assert_eq!(version, "latest");
                assert_eq!(role, "value");
                assert_eq!(status, 404);
                assert_eq!(method, "GET");
                assert_eq!(path, "/subjects/ghost-value/versions/latest");
                assert!(body.contains("40401"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_body_is_registry_error() {
        let fetcher = StubFetcher::default().with(
            "http://registry/subjects/orders-value/versions/latest",
            204,
            "",
        );
        let client = SchemaRegistryClient::with_fetcher("http://registry", fetcher);

        let err = client
            .fetch_schema("orders", VersionSelector::Latest, SchemaRole::Value)
            .await
            .unwrap_err();
        assert!(err.is_registry());
    }

    #[tokio::test]
    async fn test_malformed_envelope() {
        let fetcher = StubFetcher::default().with(
            "http://registry/subjects/orders-value/versions/latest",
            200,
            "<html>oops</html>",
        );
        let client = SchemaRegistryClient::with_fetcher("http://registry", fetcher);

        let err = client
            .fetch_schema("orders", VersionSelector::Latest, SchemaRole::Value)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Malformed registry response"));
    }

    #[tokio::test]
    async fn test_invalid_schema_text() {
        let fetcher = StubFetcher::default().with(
            "http://registry/subjects/orders-value/versions/latest",
            200,
            &envelope(5, 1, r#"{"type":"record","fields":"nope"}"#),
        );
        let client = SchemaRegistryClient::with_fetcher("http://registry", fetcher);

        let err = client
            .fetch_schema("orders", VersionSelector::Latest, SchemaRole::Value)
            .await
            .unwrap_err();
        assert!(matches!(err, AvroError::SchemaCompile { .. }));
    }

    #[tokio::test]
    async fn test_non_avro_schema_type_rejected() {
        let body = serde_json::json!({
            "id": 7,
            "subject": "orders-value",
            "version": 1,
            "schemaType": "PROTOBUF",
            "schema": "syntax = \"proto3\";",
        })
        .to_string();
        let fetcher = StubFetcher::default().with(
            "http://registry/subjects/orders-value/versions/latest",
            200,
            &body,
        );
        let client = SchemaRegistryClient::with_fetcher("http://registry", fetcher);

        let err = client
            .fetch_schema("orders", VersionSelector::Latest, SchemaRole::Value)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("PROTOBUF"));
    }

    #[tokio::test]
    async fn test_all_selector_is_not_a_single_fetch() {
        let fetcher = StubFetcher::default();
        let client = SchemaRegistryClient::with_fetcher("http://registry", fetcher);

        let err = client
            .fetch_schema("orders", VersionSelector::All, SchemaRole::Value)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(client.fetcher.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_versions_keeps_registry_order() {
        let fetcher = StubFetcher::default().with(
            "http://registry/subjects/orders-value/versions",
            200,
            "[1, 3, 2]",
        );
        let client = SchemaRegistryClient::with_fetcher("http://registry", fetcher);

        let versions = client
            .fetch_schema_versions("orders", SchemaRole::Value)
            .await
            .unwrap();
        assert_eq!(versions, vec![1, 3, 2]);
    }
}
