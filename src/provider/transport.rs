//! Outbound HTTP seam for the generation provider

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::Result;

/// Raw provider response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level failure (network, timeout, unreadable body)
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Sends a JSON request to the provider
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url` authenticated with `api_key`
    async fn post_json(
        &self,
        url: &str,
        api_key: &SecretString,
        body: &serde_json::Value,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the given request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &SecretString,
        body: &serde_json::Value,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}
