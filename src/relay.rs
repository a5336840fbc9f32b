//! Session relay between clients and the reply generator

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::provider::ReplyGenerator;
use crate::session::SessionStore;

/// Client-facing relay failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// A required field was missing, empty or of the wrong type
    #[error("{0}")]
    InvalidInput(&'static str),

    /// No session exists for the given client identifier
    #[error("client session not found")]
    NotFound,

    /// Unexpected failure; detail is for server logs only
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result of a successful query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReply {
    /// Generated reply, passed through unmodified
    pub reply: String,
    /// Effective session key for subsequent calls
    pub client_id: String,
}

/// Relays queries to the generator and tracks client sessions
#[derive(Clone)]
pub struct VoiceRelay {
    sessions: SessionStore,
    generator: Arc<dyn ReplyGenerator>,
}

impl std::fmt::Debug for VoiceRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceRelay")
            .field("sessions", &self.sessions)
            .field("generator", &self.generator.mode())
            .finish()
    }
}

impl VoiceRelay {
    /// Create a relay over an existing session store
    #[must_use]
    pub fn new(sessions: SessionStore, generator: Arc<dyn ReplyGenerator>) -> Self {
        Self {
            sessions,
            generator,
        }
    }

    /// Session store backing this relay
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Generator mode label
    #[must_use]
    pub fn mode(&self) -> &'static str {
        self.generator.mode()
    }

    /// Answer a text query on behalf of a client
    ///
    /// A missing or empty `client_id` allocates a fresh key. The session is
    /// created if absent before the generator is consulted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for missing or empty text and `Internal` if
    /// the generator task fails
    pub async fn query(
        &self,
        text: Option<&str>,
        client_id: Option<&str>,
    ) -> Result<QueryReply, RelayError> {
        let text = text
            .filter(|t| !t.is_empty())
            .ok_or(RelayError::InvalidInput("text required"))?;

        let client_id = client_id
            .filter(|id| !id.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);

        if self.sessions.ensure(&client_id).await {
            tracing::info!(client_id = %client_id, "session created");
        }

        // Run generation on its own task so a panic becomes an internal error
        let generator = Arc::clone(&self.generator);
        let owned = text.to_string();
        let reply = tokio::spawn(async move { generator.generate(&owned).await })
            .await
            .map_err(|e| RelayError::Internal(format!("generator task failed: {e}")))?;

        tracing::debug!(client_id = %client_id, reply_len = reply.len(), "query answered");

        Ok(QueryReply { reply, client_id })
    }

    /// End a client's session
    ///
    /// Does not cancel a query already in flight for the same client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a missing identifier and `NotFound` if no
    /// session exists
    pub async fn interrupt(&self, client_id: Option<&str>) -> Result<(), RelayError> {
        let client_id = client_id
            .filter(|id| !id.is_empty())
            .ok_or(RelayError::InvalidInput("clientId required"))?;

        if self.sessions.remove(client_id).await.is_none() {
            return Err(RelayError::NotFound);
        }

        tracing::info!(client_id = %client_id, "session interrupted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;

    struct Echo {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReplyGenerator for Echo {
        async fn generate(&self, text: &str) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            format!("echo: {text}")
        }

        fn mode(&self) -> &'static str {
            "echo"
        }
    }

    struct Exploding;

    #[async_trait]
    impl ReplyGenerator for Exploding {
        async fn generate(&self, _text: &str) -> String {
            panic!("generator blew up")
        }

        fn mode(&self) -> &'static str {
            "exploding"
        }
    }

    /// Generator that holds its reply until released
    #[derive(Default)]
    struct Gated {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ReplyGenerator for Gated {
        async fn generate(&self, text: &str) -> String {
            self.started.notify_one();
            self.release.notified().await;
            format!("late: {text}")
        }

        fn mode(&self) -> &'static str {
            "gated"
        }
    }

    fn echo_relay() -> (VoiceRelay, Arc<Echo>) {
        let echo = Arc::new(Echo {
            calls: AtomicUsize::new(0),
        });
        (VoiceRelay::new(SessionStore::new(), echo.clone()), echo)
    }

    #[tokio::test]
    async fn query_allocates_client_id() {
        let (relay, _) = echo_relay();

        let reply = relay
            .query(Some("What is the range of RV400?"), None)
            .await
            .unwrap();

        assert_eq!(reply.reply, "echo: What is the range of RV400?");
        assert!(Uuid::parse_str(&reply.client_id).is_ok());
        assert!(relay.sessions().contains(&reply.client_id).await);
    }

    #[tokio::test]
    async fn query_reuses_supplied_client_id() {
        let (relay, _) = echo_relay();

        let reply = relay.query(Some("hi"), Some("my-client")).await.unwrap();
        assert_eq!(reply.client_id, "my-client");

        let first = relay.sessions().get("my-client").await.unwrap();
        relay.query(Some("again"), Some("my-client")).await.unwrap();
        assert_eq!(relay.sessions().get("my-client").await.unwrap(), first);
        assert_eq!(relay.sessions().len().await, 1);
    }

    #[tokio::test]
    async fn empty_client_id_is_treated_as_absent() {
        let (relay, _) = echo_relay();
        let reply = relay.query(Some("hi"), Some("")).await.unwrap();
        assert!(!reply.client_id.is_empty());
    }

    #[tokio::test]
    async fn query_rejects_missing_text_without_session() {
        let (relay, echo) = echo_relay();

        assert_eq!(
            relay.query(None, Some("c")).await,
            Err(RelayError::InvalidInput("text required"))
        );
        assert_eq!(
            relay.query(Some(""), Some("c")).await,
            Err(RelayError::InvalidInput("text required"))
        );
        assert!(relay.sessions().is_empty().await);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generator_panic_is_internal_error() {
        let relay = VoiceRelay::new(SessionStore::new(), Arc::new(Exploding));

        let err = relay.query(Some("hi"), Some("c")).await.unwrap_err();
        assert!(matches!(err, RelayError::Internal(_)));
    }

    #[tokio::test]
    async fn interrupt_removes_session() {
        let (relay, _) = echo_relay();
        relay.query(Some("hi"), Some("c")).await.unwrap();

        assert_eq!(relay.interrupt(Some("c")).await, Ok(()));
        assert_eq!(relay.interrupt(Some("c")).await, Err(RelayError::NotFound));
    }

    #[tokio::test]
    async fn interrupt_does_not_cancel_in_flight_query() {
        let gate = Arc::new(Gated::default());
        let relay = VoiceRelay::new(SessionStore::new(), gate.clone());

        let pending = tokio::spawn({
            let relay = relay.clone();
            async move { relay.query(Some("hi"), Some("c")).await }
        });

        gate.started.notified().await;
        assert_eq!(relay.interrupt(Some("c")).await, Ok(()));
        assert!(!relay.sessions().contains("c").await);

        gate.release.notify_one();
        let reply = pending.await.unwrap().unwrap();
        assert_eq!(reply.reply, "late: hi");
        assert_eq!(reply.client_id, "c");

        // The late reply does not bring the session back
        assert!(!relay.sessions().contains("c").await);

        gate.release.notify_one();
        relay.query(Some("again"), Some("c")).await.unwrap();
        assert!(relay.sessions().contains("c").await);
    }

    #[tokio::test]
    async fn interrupt_unknown_is_not_found() {
        let (relay, _) = echo_relay();
        assert_eq!(
            relay.interrupt(Some("never-seen")).await,
            Err(RelayError::NotFound)
        );
    }

    #[tokio::test]
    async fn interrupt_requires_client_id() {
        let (relay, _) = echo_relay();
        assert_eq!(
            relay.interrupt(None).await,
            Err(RelayError::InvalidInput("clientId required"))
        );
        assert_eq!(
            relay.interrupt(Some("")).await,
            Err(RelayError::InvalidInput("clientId required"))
        );
    }
}
