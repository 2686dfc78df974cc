//! In-memory session store
//!
//! Keeps sessions in a `HashMap` behind a `tokio::sync::RwLock`. State is
//! lost on drop; useful for tests and single-process deployments.

use crate::error::{Result, SessionError};
use crate::session::Session;
use crate::store::SessionStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory session store with optional TTL
///
/// With a TTL, entries whose `updated_at` is older than the TTL are treated
/// as missing and dropped on the next access.
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Option<Duration>,
}

impl MemoryStore {
    /// Create an empty store without TTL
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose entries expire `ttl` after their last save
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Some(ttl),
        }
    }

    /// Number of stored sessions (including not yet evicted expired ones)
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// True if the store holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Check whether an id is stored
    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    fn is_stale(&self, session: &Session) -> bool {
        match self.ttl {
            Some(ttl) => Utc::now()
                .signed_duration_since(session.updated_at())
                .to_std()
                .is_ok_and(|age| age > ttl),
            None => false,
        }
    }

    /// Remove `id` only if the entry is still stale under the write lock
    async fn evict_if_stale(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let stale = sessions.get(id).is_some_and(|s| self.is_stale(s));
        if stale {
            sessions.remove(id);
            tracing::debug!(session_id = %id, "Evicted expired session");
        }
        stale
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, id: &str) -> Result<Session> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(id).cloned()
        };

        match session {
            Some(session) if self.is_stale(&session) => {
                self.evict_if_stale(id).await;
                Err(SessionError::StoreNotFound(id.to_string()))
            }
            Some(session) => Ok(session),
            None => Err(SessionError::StoreNotFound(id.to_string())),
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id().to_string(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
