//! # a3s-session
//!
//! Encrypted, cookie-carried session management for HTTP servers.
//!
//! ## Overview
//!
//! `a3s-session` keeps per-visitor state without server-side storage: the
//! session is serialized, sealed with AES-GCM, and carried in the cookie
//! itself. Optionally, a pluggable `SessionStore` keeps the state and the
//! cookie carries only the encrypted session id.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_session::{SessionConfig, SessionManager};
//!
//! # async fn example() -> a3s_session::Result<()> {
//! let manager = SessionManager::new(SessionConfig::dev(
//!     b"0123456789abcdef0123456789abcdef".to_vec(),
//! ))?;
//!
//! // First request: no cookie yet
//! let mut session = manager.load(None).await;
//! session.insert("user_id", 42)?;
//! session.add_flash("success", "Welcome back");
//! let cookie = manager.save(&mut session).await?;
//! println!("Set-Cookie: {}", cookie);
//!
//! // Next request carries the cookie back
//! let mut session = manager.load(Some(cookie.value.as_str())).await;
//! assert_eq!(session.get_i64("user_id"), Some(42));
//! assert!(session.get_flash("success").is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Stores
//!
//! - **memory** — In-process store for testing and single-node use
//! - **file** — One JSON file per session
//! - **redis** — Redis with per-entry TTL (feature `redis`)
//!
//! ## Architecture
//!
//! - **SessionManager** — load / save / rotate / destroy, owns the cipher
//! - **Session** — id, data bag, timestamps, read-once flash messages
//! - **SessionConfig** — immutable cookie and expiry policy
//! - **SessionStore** trait — optional external persistence
//! - **SessionContext** — exactly-once commit point for HTTP adapters

pub mod config;
pub mod cookie;
pub mod crypto;
pub mod error;
pub mod manager;
pub mod middleware;
pub mod session;
pub mod store;

// Re-export core types
pub use config::{SessionConfig, SessionSettings};
pub use cookie::{parse_cookie_header, SameSite, SessionCookie};
pub use error::{Result, SessionError};
pub use manager::SessionManager;
pub use middleware::SessionContext;
pub use session::Session;
pub use store::SessionStore;

// Re-export stores for convenience
pub use store::file::FileStore;
pub use store::memory::MemoryStore;
#[cfg(feature = "redis")]
pub use store::redis::{RedisStore, RedisStoreOptions};
