//! HTTP implementation of [`ResourceTransport`] for the content API.
//!
//! Wraps `GET/PUT/POST /api/{T}` and `DELETE /api/{T}/{id}` using
//! [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use folio_core::content::ContentType;
use folio_core::types::RecordId;
use folio_core::wire::{
    BulkCreateRequest, BulkCreateResponse, BulkUpdateRequest, BulkUpdateResponse, ErrorBody,
};
use serde_json::Value;

use crate::error::TransportError;
use crate::transport::ResourceTransport;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the content API, without the `/api` suffix.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `FOLIO_API_URL`          | `http://localhost:3000` |
    /// | `FOLIO_API_TIMEOUT_SECS` | `30`                    |
    ///
    /// An unparseable timeout falls back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = std::env::var("FOLIO_API_URL").unwrap_or(defaults.base_url);
        let timeout_secs = std::env::var("FOLIO_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);
        Self {
            base_url,
            timeout_secs,
        }
    }
}

/// HTTP client for the content API.
pub struct HttpResourceClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpResourceClient {
    /// Create a client with its own connection pool.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self, kind: ContentType) -> String {
        format!("{}/api/{}", self.base_url, kind.slug())
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. On failure the
    /// message is taken from the JSON error body when there is one.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(error) => error.error,
            Err(_) if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
            Err(_) => body,
        };
        Err(TransportError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ResourceTransport for HttpResourceClient {
    async fn list(&self, kind: ContentType) -> Result<Value, TransportError> {
        let response = self.client.get(self.collection_url(kind)).send().await?;
        Self::parse_response(response).await
    }

    async fn bulk_update(
        &self,
        kind: ContentType,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateResponse, TransportError> {
        tracing::debug!(
            collection = kind.slug(),
            updated = request.updated.len(),
            deleted = request.deleted_ids.len(),
            "Sending bulk update",
        );
        let response = self
            .client
            .put(self.collection_url(kind))
            .json(&request.to_json(kind))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn bulk_create(
        &self,
        kind: ContentType,
        request: &BulkCreateRequest,
    ) -> Result<BulkCreateResponse, TransportError> {
        tracing::debug!(
            collection = kind.slug(),
            count = request.records.len(),
            "Sending bulk create",
        );
        let response = self
            .client
            .post(self.collection_url(kind))
            .json(&request.to_json(kind))
            .send()
            .await?;
        let body: Value = Self::parse_response(response).await?;
        Ok(BulkCreateResponse::from_json(kind, body))
    }

    async fn delete_one(&self, kind: ContentType, id: &RecordId) -> Result<(), TransportError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.collection_url(kind), id))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
