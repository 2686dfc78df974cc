//! Session configuration
//!
//! `SessionConfig` is built once at startup (via [`SessionConfig::new`] or
//! [`SessionConfig::dev`] plus `with_*` builder methods) and shared read-only
//! by every request. `SessionSettings` is the serde form of the same options
//! for loading from JSON files.

use crate::cookie::SameSite;
use crate::error::{Result, SessionError};
use crate::store::SessionStore;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Default cookie name
pub const DEFAULT_COOKIE_NAME: &str = "sessionx";

/// Default expiry horizon (24 hours)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Default rotation interval (15 minutes)
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Immutable session policy
#[derive(Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub(crate) secret_key: Vec<u8>,
    /// Expiry horizon; zero disables expiry and omits `Max-Age`
    pub max_age: Duration,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    /// Rotation threshold; zero disables automatic rotation
    pub rotation_interval: Duration,
    pub store: Option<Arc<dyn SessionStore>>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("secret_key", &format_args!("<{} bytes>", self.secret_key.len()))
            .field("max_age", &self.max_age)
            .field("path", &self.path)
            .field("domain", &self.domain)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("same_site", &self.same_site)
            .field("rotation_interval", &self.rotation_interval)
            .field("store", &self.store.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

impl SessionConfig {
    /// Production defaults: `Secure`, `HttpOnly`, `SameSite=Lax`, 24h expiry,
    /// 15 minute rotation
    ///
    /// The key length is validated by `SessionManager::new`.
    pub fn new(secret_key: impl Into<Vec<u8>>) -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            secret_key: secret_key.into(),
            max_age: DEFAULT_MAX_AGE,
            path: "/".to_string(),
            domain: None,
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
            store: None,
        }
    }

    /// Development defaults: same as [`new`](Self::new) without `Secure`,
    /// so cookies work over plain HTTP
    pub fn dev(secret_key: impl Into<Vec<u8>>) -> Self {
        Self::new(secret_key).with_secure(false)
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    pub fn with_rotation_interval(mut self, interval: Duration) -> Self {
        self.rotation_interval = interval;
        self
    }

    /// Keep session state in `store`; the cookie then carries only the id
    pub fn with_store(mut self, store: impl SessionStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Share an existing store handle
    pub fn with_shared_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Secret key length in bytes
    pub fn key_len(&self) -> usize {
        self.secret_key.len()
    }
}

// ============================================================================
// File-based settings
// ============================================================================

/// Serializable session settings
///
/// All fields except `secretKey` are optional and default to the production
/// values of [`SessionConfig::new`]. The key is either raw UTF-8 text or
/// base64 prefixed with `base64:`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    pub secret_key: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_true")]
    pub secure: bool,
    #[serde(default = "default_true")]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: SameSite,
    #[serde(default = "default_rotation_interval_secs")]
    pub rotation_interval_secs: u64,
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

fn default_max_age_secs() -> u64 {
    DEFAULT_MAX_AGE.as_secs()
}

fn default_path() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_rotation_interval_secs() -> u64 {
    DEFAULT_ROTATION_INTERVAL.as_secs()
}

impl SessionSettings {
    /// Parse settings from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Load settings from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SessionError::Config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    /// Decode the secret key
    pub fn key_bytes(&self) -> Result<Vec<u8>> {
        match self.secret_key.strip_prefix("base64:") {
            Some(encoded) => BASE64.decode(encoded.trim()).map_err(|e| {
                SessionError::Config(format!("Invalid base64 secret key: {}", e))
            }),
            None => Ok(self.secret_key.as_bytes().to_vec()),
        }
    }

    /// Build a `SessionConfig` without a store
    pub fn into_config(self) -> Result<SessionConfig> {
        let key = self.key_bytes()?;
        let mut config = SessionConfig::new(key)
            .with_cookie_name(self.cookie_name)
            .with_max_age(Duration::from_secs(self.max_age_secs))
            .with_path(self.path)
            .with_secure(self.secure)
            .with_http_only(self.http_only)
            .with_same_site(self.same_site)
            .with_rotation_interval(Duration::from_secs(self.rotation_interval_secs));
        config.domain = self.domain;
        Ok(config)
    }
}
