//! Generation provider adapter
//!
//! Wraps a single call to the external generation API. The adapter never
//! fails towards its caller: every failure reaching or parsing the provider
//! is collapsed into a mock reply at [`ReplyGenerator::generate`], while
//! [`ProviderAdapter::try_generate`] keeps the cause inspectable.

pub mod gemini;
pub mod retry;
pub mod transport;

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

pub use retry::{RetryPolicy, is_transient};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};

use crate::Result;
use crate::config::ProviderConfig;
use crate::persona::Persona;

/// Produces a reply for a user query
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate a reply; always resolves to a usable string
    async fn generate(&self, text: &str) -> String;

    /// Short label for status output (e.g. "gemini", "mock")
    fn mode(&self) -> &'static str;
}

/// Why a provider call did not yield a reply
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    /// No credential configured
    #[error("Gemini key missing, using mock reply.")]
    NotConfigured,

    /// Provider answered with a non-success status
    #[error("provider returned {0}")]
    Status(u16),

    /// Provider answered but the reply field was missing or malformed
    #[error("provider returned unexpected structure.")]
    UnexpectedStructure,

    /// Request never completed (network failure, timeout)
    #[error("provider error: {0}")]
    Transport(String),
}

/// Adapter around the generation API
#[derive(Clone)]
pub struct ProviderAdapter {
    persona: Arc<Persona>,
    api_key: Option<SecretString>,
    endpoint: String,
    retry: RetryPolicy,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("persona", &self.persona.id)
            .field("configured", &self.api_key.is_some())
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ProviderAdapter {
    /// Create an adapter backed by the reqwest transport
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL is invalid or the HTTP client cannot be built
    pub fn new(config: &ProviderConfig, persona: Arc<Persona>) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config.timeout)?);
        Self::with_transport(config, persona, transport)
    }

    /// Create an adapter with a custom transport
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL is invalid
    pub fn with_transport(
        config: &ProviderConfig,
        persona: Arc<Persona>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self {
            persona,
            api_key: config.api_key.clone(),
            endpoint: gemini::endpoint(&config.api_base, &config.model)?,
            retry: config.retry.clone(),
            transport,
        })
    }

    /// Whether a credential is configured
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Call the provider, reporting the failure cause on error
    ///
    /// # Errors
    ///
    /// Returns the reason no reply could be obtained
    pub async fn try_generate(&self, text: &str) -> std::result::Result<String, ProviderFailure> {
        let api_key = self.api_key.as_ref().ok_or(ProviderFailure::NotConfigured)?;
        let body = gemini::request_body(&self.persona.render_prompt(text));

        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            let response = self
                .transport
                .post_json(&self.endpoint, api_key, &body)
                .await
                .map_err(|e| ProviderFailure::Transport(e.0))?;

            if response.is_success() || !self.retry.should_retry(attempt, response.status) {
                break response;
            }

            tracing::warn!(
                status = response.status,
                attempt,
                delay_ms = u64::try_from(self.retry.delay.as_millis()).unwrap_or(u64::MAX),
                "provider overloaded, retrying"
            );
            tokio::time::sleep(self.retry.delay).await;
        };

        if !response.is_success() {
            tracing::warn!(
                status = response.status,
                body = %response.body,
                "provider returned non-success status"
            );
            return Err(ProviderFailure::Status(response.status));
        }

        gemini::parse_reply(&response.body).ok_or(ProviderFailure::UnexpectedStructure)
    }
}

#[async_trait]
impl ReplyGenerator for ProviderAdapter {
    async fn generate(&self, text: &str) -> String {
        match self.try_generate(text).await {
            Ok(reply) => reply,
            Err(failure) => {
                match &failure {
                    ProviderFailure::NotConfigured => {
                        tracing::debug!("no provider key, returning mock reply");
                    }
                    ProviderFailure::Transport(message) => {
                        tracing::error!(error = %message, "provider call failed");
                    }
                    other => tracing::warn!(reason = %other, "provider gave no usable reply"),
                }
                self.persona.mock_reply(text, &failure.to_string())
            }
        }
    }

    fn mode(&self) -> &'static str {
        if self.is_configured() { "gemini" } else { "mock" }
    }
}
