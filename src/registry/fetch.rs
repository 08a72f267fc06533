//! Raw HTTP GET capability used by the registry client.

use crate::{AvroError, AvroResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Raw response of an HTTP GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Request method, kept for diagnostics
    pub method: String,
    /// Request path, kept for diagnostics
    pub path: String,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a GET response for `path`
    pub fn new(status: u16, path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            method: "GET".to_string(),
            path: path.into(),
            body: body.into(),
        }
    }

    /// Body as text, lossy for invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Capability to GET a URL and return the raw response
///
/// Retries, TLS and pooling belong to the implementation. Any transport failure
/// must be reported as [`AvroError::Transport`]; non-2xx responses are not errors
/// at this level.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Issue a GET request
    async fn get(&self, url: &str) -> AvroResult<HttpResponse>;
}

#[async_trait]
impl<T: HttpFetch + ?Sized> HttpFetch for Arc<T> {
    async fn get(&self, url: &str) -> AvroResult<HttpResponse> {
        (**self).get(url).await
    }
}

/// [`HttpFetch`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a fetcher with a default client
    pub fn new() -> AvroResult<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| AvroError::transport_with_source("Failed to create HTTP client", e))?;

        Ok(Self { client })
    }

    /// Use a preconfigured client (timeouts, proxies, auth headers)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> AvroResult<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "application/vnd.schemaregistry.v1+json, application/json",
            )
            .send()
            .await
            .map_err(|e| AvroError::transport_with_source(format!("GET {} failed", url), e))?;

        let status = response.status().as_u16();
        let path = response.url().path().to_string();
        let body = response.bytes().await.map_err(|e| {
            AvroError::transport_with_source(format!("Failed to read response body from {}", url), e)
        })?;

        Ok(HttpResponse::new(status, path, body.to_vec()))
    }
}
