//! Redis session store
//!
//! Stores each session as JSON under `<prefix><id>` with a TTL, using a
//! `ConnectionManager` so dropped connections are re-established
//! transparently.

use crate::error::{Result, SessionError};
use crate::session::Session;
use crate::store::SessionStore;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Default key prefix
pub const DEFAULT_PREFIX: &str = "sessionx:";

/// Default entry TTL (24 hours)
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Connection options for [`RedisStore`]
#[derive(Debug, Clone)]
pub struct RedisStoreOptions {
    /// Redis URL, e.g. `redis://:password@127.0.0.1:6379/0`
    pub url: String,
    pub prefix: String,
    /// Entry TTL; zero falls back to [`DEFAULT_TTL`]
    pub ttl: Duration,
}

impl Default for RedisStoreOptions {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/".to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            ttl: DEFAULT_TTL,
        }
    }
}

/// Redis-backed session store
pub struct RedisStore {
    connection: ConnectionManager,
    prefix: String,
    ttl: Duration,
}

impl RedisStore {
    /// Connect and verify the server answers `PING`
    pub async fn connect(options: RedisStoreOptions) -> Result<Self> {
        let client = redis::Client::open(options.url.as_str())
            .map_err(|e| SessionError::Config(format!("Invalid Redis URL: {}", e)))?;
        let endpoint = endpoint(client.get_connection_info());
        let mut connection = ConnectionManager::new(client)
            .await
            .map_err(|e| SessionError::Store(format!("Failed to connect to Redis: {}", e)))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| SessionError::Store(format!("Redis PING failed: {}", e)))?;

        tracing::info!(
            endpoint = %endpoint,
            prefix = %options.prefix,
            "Connected to Redis session store"
        );

        Ok(Self {
            connection,
            prefix: options.prefix,
            ttl: effective_ttl(options.ttl),
        })
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Entry TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Zero means "use the default"
fn effective_ttl(ttl: Duration) -> Duration {
    if ttl.is_zero() {
        DEFAULT_TTL
    } else {
        ttl
    }
}

/// Address and database of a connection, without credentials
fn endpoint(info: &redis::ConnectionInfo) -> String {
    format!("{}/{}", info.addr, info.redis.db)
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn load(&self, id: &str) -> Result<Session> {
        let mut conn = self.connection.clone();
        let data: Option<Vec<u8>> = conn
            .get(self.key(id))
            .await
            .map_err(|e| SessionError::Store(format!("Redis GET failed: {}", e)))?;

        let data = data.ok_or_else(|| SessionError::StoreNotFound(id.to_string()))?;
        serde_json::from_slice(&data).map_err(Into::into)
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut conn = self.connection.clone();
        let data = serde_json::to_vec(session)?;
        let ttl = self.ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(self.key(session.id()), data, ttl)
            .await
            .map_err(|e| SessionError::Store(format!("Redis SET failed: {}", e)))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(self.key(id))
            .await
            .map_err(|e| SessionError::Store(format!("Redis DEL failed: {}", e)))
    }

    fn name(&self) -> &str {
        "redis"
    }
}
