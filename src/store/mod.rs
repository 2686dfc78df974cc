//! Session store trait — optional external persistence for session state
//!
//! When a store is configured, the session cookie carries only the
//! (encrypted) session id and the full state lives in the backend.
//! Backends (in-memory, file, Redis, databases, ...) implement
//! `SessionStore` and plug into `SessionConfig::with_store`.

use crate::error::Result;
use crate::session::Session;
use async_trait::async_trait;

pub mod file;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

/// Persistence backend keyed by session id
///
/// Implementations provide their own concurrency safety. The manager calls
/// `load` once per request load and never retries. A save calls `save`
/// once, followed by `delete` for the pre-rotation id when the session was
/// rotated since it was loaded. A destroy calls `delete` for the current
/// id and again for a pending pre-rotation id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session by id
    ///
    /// Returns `SessionError::StoreNotFound` for unknown ids.
    async fn load(&self, id: &str) -> Result<Session>;

    /// Insert or replace the session under its current id
    async fn save(&self, session: &Session) -> Result<()>;

    /// Delete a session; deleting an unknown id is not an error
    async fn delete(&self, id: &str) -> Result<()>;

    /// Backend name (e.g., "memory", "file", "redis")
    fn name(&self) -> &str;
}
