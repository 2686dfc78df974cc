//! File-based session store
//!
//! Persists each session as `<dir>/<id>.json`. Writes are atomic
//! (temp file + rename) so a crash never leaves a half-written session.

use crate::crypto::is_valid_session_id;
use crate::error::{Result, SessionError};
use crate::session::Session;
use crate::store::SessionStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// JSON file-per-session store
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir` (created on first save)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, id: &str) -> Result<PathBuf> {
        // Ids come from cookies; never let one escape the directory
        if !is_valid_session_id(id) {
            return Err(SessionError::Store(format!("Invalid session id '{}'", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load(&self, id: &str) -> Result<Session> {
        let path = self.session_path(id)?;

        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SessionError::StoreNotFound(id.to_string()));
            }
            Err(e) => {
                return Err(SessionError::Store(format!(
                    "Failed to read session file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let session: Session = serde_json::from_str(&json)?;
        tracing::debug!(path = %path.display(), "Session loaded");
        Ok(session)
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let path = self.session_path(session.id())?;
        let json = serde_json::to_vec(session)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            SessionError::Store(format!(
                "Failed to create session directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, json).await.map_err(|e| {
            SessionError::Store(format!(
                "Failed to write session file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;

        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            SessionError::Store(format!(
                "Failed to rename session file {} → {}: {}",
                tmp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %path.display(), "Session saved");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.session_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Store(format!(
                "Failed to delete session file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}
