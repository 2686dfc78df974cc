//! Session manager — load, save, rotate and destroy sessions
//!
//! The manager is shared read-only by all requests. It decrypts inbound
//! tokens, enforces expiry, and seals outbound state. Without a store the
//! whole session rides in the cookie; with one, the cookie carries only the
//! encrypted session id.
//!
//! Reads fail open: a missing, malformed, tampered, expired, or unknown
//! session token yields a fresh session, never an error. Writes surface
//! their errors to the caller.

use crate::config::SessionConfig;
use crate::cookie::{parse_cookie_header, SameSite, SessionCookie};
use crate::crypto::{generate_session_id, is_valid_session_id, SessionCipher};
use crate::error::{Result, SessionError};
use crate::session::Session;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Browsers reject cookies larger than this
const MAX_COOKIE_VALUE_LEN: usize = 4096;

/// Encrypted cookie session manager
#[derive(Debug)]
pub struct SessionManager {
    config: SessionConfig,
    cipher: SessionCipher,
}

impl SessionManager {
    /// Create a manager, validating the secret key length (16, 24 or 32 bytes)
    pub fn new(config: SessionConfig) -> Result<Self> {
        let cipher = SessionCipher::new(&config.secret_key)?;

        if config.same_site == SameSite::None && !config.secure {
            tracing::warn!(
                cookie = %config.cookie_name,
                "SameSite=None without Secure; browsers will reject the session cookie"
            );
        }

        tracing::debug!(
            cookie = %config.cookie_name,
            algorithm = cipher.algorithm(),
            store = config.store.as_ref().map(|s| s.name()).unwrap_or("cookie"),
            "Session manager created"
        );

        Ok(Self { config, cipher })
    }

    /// Get the configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mint a fresh, empty session
    pub fn new_session(&self) -> Session {
        Session::new(generate_session_id(), Utc::now())
    }

    /// Load the session carried by a cookie value
    ///
    /// Never fails: any problem with the token results in a fresh session.
    pub async fn load(&self, cookie_value: Option<&str>) -> Session {
        let Some(token) = cookie_value.map(str::trim).filter(|t| !t.is_empty()) else {
            return self.new_session();
        };

        let session = match self.decode(token).await {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!(reason = %e, "Discarding session token");
                return self.new_session();
            }
        };

        if self.is_expired(&session) {
            tracing::debug!(updated_at = %session.updated_at(), "Session expired");
            return self.new_session();
        }

        session
    }

    /// Load the session from a raw request `Cookie` header
    pub async fn load_from_header(&self, cookie_header: Option<&str>) -> Session {
        let value =
            cookie_header.and_then(|header| parse_cookie_header(header, &self.config.cookie_name));
        self.load(value).await
    }

    /// Persist a session and produce the outbound cookie
    ///
    /// Refreshes `updated_at` first. In store mode the state is written to
    /// the store, and if the session was rotated since it was loaded, the
    /// entry under its old id is deleted.
    pub async fn save(&self, session: &mut Session) -> Result<SessionCookie> {
        session.touch(Utc::now());

        let value = match &self.config.store {
            None => self.encode(session)?,
            Some(store) => {
                store.save(session).await?;
                if let Some(previous) = session.previous_id().map(str::to_string) {
                    if previous != session.id() {
                        store.delete(&previous).await?;
                    }
                }
                self.cipher.seal(session.id().as_bytes())?
            }
        };
        session.clear_previous_id();

        if value.len() > MAX_COOKIE_VALUE_LEN {
            tracing::warn!(
                cookie = %self.config.cookie_name,
                len = value.len(),
                "Session cookie exceeds 4096 bytes; consider a session store"
            );
        }

        Ok(self.cookie(value))
    }

    /// Give the session a new id
    ///
    /// Only mutates the session; call [`save`](Self::save) afterwards so the
    /// new id reaches the client and the store.
    pub fn rotate(&self, session: &mut Session) {
        session.replace_id(generate_session_id(), Utc::now());
        tracing::debug!("Session id rotated");
    }

    /// Whether the rotation interval has elapsed for this session
    pub fn needs_rotation(&self, session: &Session) -> bool {
        let interval = self.config.rotation_interval;
        !interval.is_zero() && elapsed(session.rotated_at(), Utc::now()) >= interval
    }

    /// Whether the session is past its max age
    pub fn is_expired(&self, session: &Session) -> bool {
        let max_age = self.config.max_age;
        !max_age.is_zero() && elapsed(session.updated_at(), Utc::now()) > max_age
    }

    /// Destroy a session and produce a cookie that clears it on the client
    pub async fn destroy(&self, session: &Session) -> Result<SessionCookie> {
        if let Some(store) = &self.config.store {
            store.delete(session.id()).await?;
            if let Some(previous) = session.previous_id() {
                store.delete(previous).await?;
            }
        }

        tracing::debug!("Session destroyed");
        Ok(self.cookie(String::new()).into_removal())
    }

    /// Seal the full session state (embedded mode)
    pub(crate) fn encode(&self, session: &Session) -> Result<String> {
        let json = serde_json::to_vec(session)?;
        self.cipher.seal(&json)
    }

    async fn decode(&self, token: &str) -> Result<Session> {
        let plaintext = self.cipher.open(token)?;

        let session: Session = match &self.config.store {
            None => serde_json::from_slice(&plaintext)?,
            Some(store) => {
                let id = String::from_utf8(plaintext).map_err(|_| {
                    SessionError::Decryption("Session id is not UTF-8".to_string())
                })?;
                if !is_valid_session_id(&id) {
                    return Err(SessionError::Decryption("Malformed session id".to_string()));
                }
                store.load(&id).await?
            }
        };

        if session.id().is_empty() {
            return Err(SessionError::Decryption("Session has empty id".to_string()));
        }
        Ok(session)
    }

    fn cookie(&self, value: String) -> SessionCookie {
        SessionCookie {
            name: self.config.cookie_name.clone(),
            value,
            path: self.config.path.clone(),
            domain: self.config.domain.clone(),
            max_age: (!self.config.max_age.is_zero())
                .then(|| i64::try_from(self.config.max_age.as_secs()).unwrap_or(i64::MAX)),
            expires: None,
            secure: self.config.secure,
            http_only: self.config.http_only,
            same_site: self.config.same_site,
        }
    }
}

/// Time from `since` to `now`; timestamps in the future count as zero
fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(since)
        .to_std()
        .unwrap_or(Duration::ZERO)
}
