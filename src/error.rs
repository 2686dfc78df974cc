//! Error types for a3s-session

use thiserror::Error;

/// Errors that can occur in session handling
///
/// Read-path failures (decryption, malformed payloads, store misses) never
/// reach callers of `SessionManager::load`; they are logged and replaced by
/// a fresh session. Write-path failures are returned as-is.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Invalid configuration (e.g. secret key of the wrong length)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sealing a session payload failed
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Opening a session token failed (bad encoding, bad tag, short input)
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session id not present in the store
    #[error("Session not found: {0}")]
    StoreNotFound(String),

    /// Store backend failure
    #[error("Store error: {0}")]
    Store(String),

    /// Attempt to write a key reserved for internal session bookkeeping
    #[error("Key '{0}' is reserved for internal use")]
    ReservedKey(String),
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
