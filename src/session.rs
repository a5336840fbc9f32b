//! In-memory session store keyed by client identifier
//!
//! A session only records that a client has queried at least once.
//! Records live until explicitly removed or the process exits; nothing
//! expires them.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// A client session record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub created_at: DateTime<Utc>,
}

/// Process-scoped session map, cheap to clone and share across handlers
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the session for `key` unless it already exists
    ///
    /// Returns true if a new record was created. An existing record's
    /// creation time is never touched.
    pub async fn ensure(&self, key: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Session {
                    created_at: Utc::now(),
                });
                true
            }
        }
    }

    /// Remove the session for `key`, returning it if it existed
    pub async fn remove(&self, key: &str) -> Option<Session> {
        self.sessions.write().await.remove(key)
    }

    /// Look up a session
    pub async fn get(&self, key: &str) -> Option<Session> {
        self.sessions.read().await.get(key).copied()
    }

    /// Whether a session exists for `key`
    pub async fn contains(&self, key: &str) -> bool {
        self.sessions.read().await.contains_key(key)
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
