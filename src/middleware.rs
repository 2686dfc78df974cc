//! Per-request commit point for HTTP adapters
//!
//! `SessionContext` wraps one request's session and guarantees the cookie
//! is produced at most once: adapters call [`SessionContext::commit`] from
//! their write interceptor (first byte, headers flush, or response end) and
//! every call after the first successful one is a no-op.

use crate::cookie::SessionCookie;
use crate::error::Result;
use crate::manager::SessionManager;
use crate::session::Session;
use std::sync::Arc;

/// A request-scoped session with exactly-once commit
pub struct SessionContext {
    manager: Arc<SessionManager>,
    session: Session,
    destroy: bool,
    committed: bool,
}

impl SessionContext {
    /// Load the session for a request from its `Cookie` header
    pub async fn begin(manager: Arc<SessionManager>, cookie_header: Option<&str>) -> Self {
        let session = manager.load_from_header(cookie_header).await;
        Self {
            manager,
            session,
            destroy: false,
            committed: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    /// Rotate the session id now (e.g. after a privilege change)
    pub fn rotate(&mut self) {
        self.manager.rotate(&mut self.session);
    }

    /// Destroy the session at commit instead of saving it
    pub fn destroy(&mut self) {
        self.destroy = true;
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Save (or destroy) the session and return the cookie to emit
    ///
    /// Rotates the id first when the rotation interval has elapsed.
    /// Returns `Ok(None)` once a previous commit has succeeded; a failed
    /// commit may be retried.
    pub async fn commit(&mut self) -> Result<Option<SessionCookie>> {
        if self.committed {
            return Ok(None);
        }

        let cookie = if self.destroy {
            self.manager.destroy(&self.session).await?
        } else {
            if self.manager.needs_rotation(&self.session) {
                self.manager.rotate(&mut self.session);
            }
            self.manager.save(&mut self.session).await?
        };

        self.committed = true;
        Ok(Some(cookie))
    }

    /// Consume the context, returning the session
    pub fn into_session(self) -> Session {
        self.session
    }
}
