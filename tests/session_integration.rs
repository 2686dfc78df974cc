//! Session manager integration tests
//!
//! End-to-end tests exercising full request cycles through the public API:
//! embedded-cookie and store-backed modes, tamper resistance, expiry,
//! flash messages, rotation, commit points, and concurrency.

use a3s_session::{
    FileStore, MemoryStore, SameSite, SessionConfig, SessionContext, SessionError,
    SessionManager, SessionSettings,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64;
use base64::Engine;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";

fn test_manager() -> SessionManager {
    SessionManager::new(SessionConfig::dev(KEY.to_vec())).unwrap()
}

// ─── Construction ────────────────────────────────────────────────

#[test]
fn test_invalid_key_lengths_rejected() {
    for len in [0, 10, 20, 31, 48] {
        let result = SessionManager::new(SessionConfig::new(vec![1u8; len]));
        assert!(matches!(result, Err(SessionError::Config(_))), "len {}", len);
    }
}

#[test]
fn test_config_error_message() {
    let err = SessionManager::new(SessionConfig::new(vec![1u8; 10])).unwrap_err();
    assert!(err.to_string().contains("16, 24, or 32"));
}

// ─── Round trip ──────────────────────────────────────────────────

#[tokio::test]
async fn test_roundtrip_all_key_sizes() {
    for len in [16, 24, 32] {
        let manager = SessionManager::new(SessionConfig::dev(vec![0x5A; len])).unwrap();

        let mut session = manager.load(None).await;
        session.insert("user", "alice").unwrap();
        session
            .insert("prefs", serde_json::json!({"theme": "dark", "langs": ["en", "fr"]}))
            .unwrap();
        let cookie = manager.save(&mut session).await.unwrap();

        let loaded = manager.load(Some(cookie.value.as_str())).await;
        assert_eq!(loaded.id(), session.id());
        assert_eq!(loaded.created_at(), session.created_at());
        assert_eq!(loaded.get_str("user"), Some("alice"));
        assert_eq!(loaded.get_value("prefs"), session.get_value("prefs"));
    }
}

#[tokio::test]
async fn test_visit_counter_across_requests() {
    let manager = test_manager();
    let mut cookie_value: Option<String> = None;

    for expected in 1..=5 {
        let mut session = manager.load(cookie_value.as_deref()).await;
        let count = session.get_i64("count").unwrap_or(0) + 1;
        session.insert("count", count).unwrap();
        assert_eq!(count, expected);

        cookie_value = Some(manager.save(&mut session).await.unwrap().value);
    }
}

// ─── Fail-open ───────────────────────────────────────────────────

#[tokio::test]
async fn test_foreign_key_cookie_yields_fresh_session() {
    let manager = test_manager();
    let other = SessionManager::new(SessionConfig::dev(vec![0x01; 16])).unwrap();

    let mut session = other.load(None).await;
    session.insert("admin", true).unwrap();
    let cookie = other.save(&mut session).await.unwrap();

    let loaded = manager.load(Some(cookie.value.as_str())).await;
    assert_ne!(loaded.id(), session.id());
    assert!(loaded.is_empty());
}

#[tokio::test]
async fn test_every_bit_flip_yields_fresh_session() {
    let manager = test_manager();
    let mut session = manager.load(None).await;
    session.insert("role", "admin").unwrap();
    let cookie = manager.save(&mut session).await.unwrap();
    let raw = BASE64.decode(&cookie.value).unwrap();

    for i in 0..raw.len() {
        let mut tampered = raw.clone();
        tampered[i] ^= 1 << (i % 8);
        let loaded = manager.load(Some(BASE64.encode(&tampered).as_str())).await;
        assert_ne!(loaded.id(), session.id());
        assert!(loaded.is_empty());
    }
}

#[tokio::test]
async fn test_truncated_cookie_yields_fresh_session() {
    let manager = test_manager();
    let mut session = manager.load(None).await;
    let cookie = manager.save(&mut session).await.unwrap();

    let truncated = &cookie.value[..cookie.value.len() / 2];
    let loaded = manager.load(Some(truncated)).await;
    assert_ne!(loaded.id(), session.id());
}

#[tokio::test]
async fn test_fresh_session_shape() {
    let manager = test_manager();
    let session = manager.load(None).await;

    assert!(session.is_empty());
    assert!(!session.id().is_empty());
    assert_eq!(session.created_at(), session.updated_at());
}

// ─── Nonces ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_no_nonce_reuse_across_saves() {
    let manager = test_manager();
    let mut session = manager.load(None).await;
    session.insert("k", "v").unwrap();

    let mut nonces = HashSet::new();
    for _ in 0..10_000 {
        let cookie = manager.save(&mut session).await.unwrap();
        let raw = BASE64.decode(&cookie.value).unwrap();
        assert!(nonces.insert(raw[..12].to_vec()));
    }
    assert_eq!(nonces.len(), 10_000);
}

// ─── Flash messages ──────────────────────────────────────────────

#[tokio::test]
async fn test_flash_survives_one_redirect() {
    let manager = test_manager();

    // POST /login sets a flash and redirects
    let mut session = manager.load(None).await;
    session.add_flash("success", "Logged in");
    let cookie = manager.save(&mut session).await.unwrap();

    // GET /dashboard consumes it
    let mut session = manager.load(Some(cookie.value.as_str())).await;
    assert!(session.has_flash("success"));
    assert_eq!(
        session.get_flash("success"),
        Some(serde_json::json!("Logged in"))
    );
    let cookie = manager.save(&mut session).await.unwrap();

    // Next request sees nothing
    let mut session = manager.load(Some(cookie.value.as_str())).await;
    assert!(!session.has_flash("success"));
    assert!(session.get_flashes().is_empty());
}

#[tokio::test]
async fn test_get_flashes_returns_all() {
    let manager = test_manager();
    let mut session = manager.load(None).await;
    session.add_flash("success", "Saved");
    session.add_flash("warning", "Disk almost full");
    let cookie = manager.save(&mut session).await.unwrap();

    let mut session = manager.load(Some(cookie.value.as_str())).await;
    let flashes = session.get_flashes();
    assert_eq!(flashes.len(), 2);
    assert_eq!(flashes["success"], "Saved");
    assert_eq!(flashes["warning"], "Disk almost full");
    assert!(!session.has_flash("success"));
    assert!(!session.has_flash("warning"));
}

// ─── Rotation ────────────────────────────────────────────────────

#[tokio::test]
async fn test_rotate_on_login() {
    let manager = test_manager();
    let mut session = manager.load(None).await;
    let anonymous_id = session.id().to_string();

    session.insert("user_id", "12345").unwrap();
    manager.rotate(&mut session);
    let cookie = manager.save(&mut session).await.unwrap();

    let loaded = manager.load(Some(cookie.value.as_str())).await;
    assert_ne!(loaded.id(), anonymous_id);
    assert_eq!(loaded.id(), session.id());
    assert_eq!(loaded.get_str("user_id"), Some("12345"));
    assert!(loaded.rotated_at() <= loaded.updated_at());
}

// ─── Store-backed mode ───────────────────────────────────────────

#[tokio::test]
async fn test_memory_store_cycle() {
    let store = MemoryStore::new();
    let config = SessionConfig::dev(KEY.to_vec()).with_store(store.clone());
    let manager = SessionManager::new(config).unwrap();

    let mut session = manager.load(None).await;
    session.insert("cart", vec!["apple", "pear"]).unwrap();
    let cookie = manager.save(&mut session).await.unwrap();
    assert_eq!(store.len().await, 1);

    let mut loaded = manager.load(Some(cookie.value.as_str())).await;
    assert_eq!(
        loaded.get::<Vec<String>>("cart"),
        Some(vec!["apple".to_string(), "pear".to_string()])
    );

    manager.rotate(&mut loaded);
    let rotated_cookie = manager.save(&mut loaded).await.unwrap();
    assert_eq!(store.len().await, 1);
    assert!(store.contains(loaded.id()).await);

    // The pre-rotation cookie no longer resolves
    let stale = manager.load(Some(cookie.value.as_str())).await;
    assert_ne!(stale.id(), loaded.id());
    assert!(stale.is_empty());

    let clear = manager.destroy(&loaded).await.unwrap();
    assert!(clear.is_removal());
    assert!(store.is_empty().await);

    let gone = manager.load(Some(rotated_cookie.value.as_str())).await;
    assert!(gone.is_empty());
}

#[tokio::test]
async fn test_file_store_cycle() {
    let dir = std::env::temp_dir().join(format!("a3s-session-it-{}", uuid::Uuid::new_v4()));
    let config = SessionConfig::dev(KEY.to_vec()).with_store(FileStore::new(&dir));
    let manager = SessionManager::new(config).unwrap();

    let mut session = manager.load(None).await;
    session.insert("n", 7).unwrap();
    let cookie = manager.save(&mut session).await.unwrap();
    assert!(dir.join(format!("{}.json", session.id())).exists());

    let loaded = manager.load(Some(cookie.value.as_str())).await;
    assert_eq!(loaded.get_i64("n"), Some(7));

    manager.destroy(&loaded).await.unwrap();
    assert!(!dir.join(format!("{}.json", session.id())).exists());

    std::fs::remove_dir_all(&dir).unwrap();
}

// ─── Commit point ────────────────────────────────────────────────

#[tokio::test]
async fn test_context_emits_cookie_once() {
    let manager = Arc::new(test_manager());

    let mut ctx = SessionContext::begin(manager.clone(), Some("other=1")).await;
    ctx.session_mut().insert("seen", true).unwrap();

    let cookie = ctx.commit().await.unwrap().expect("first commit emits cookie");
    assert!(ctx.commit().await.unwrap().is_none());

    let header = format!("other=1; {}={}", cookie.name, cookie.value);
    let ctx = SessionContext::begin(manager, Some(header.as_str())).await;
    assert_eq!(ctx.session().get_bool("seen"), Some(true));
}

// ─── Settings ────────────────────────────────────────────────────

#[tokio::test]
async fn test_manager_from_settings() {
    let settings = SessionSettings::from_json(
        r#"{"secretKey": "0123456789abcdef", "cookieName": "app", "sameSite": "Strict", "maxAgeSecs": 600}"#,
    )
    .unwrap();
    let manager = SessionManager::new(settings.into_config().unwrap()).unwrap();

    let mut session = manager.load(None).await;
    let cookie = manager.save(&mut session).await.unwrap();
    let header = cookie.to_string();

    assert!(header.starts_with("app="));
    assert!(header.contains("Max-Age=600"));
    assert!(header.contains("SameSite=Strict"));
    assert_eq!(cookie.same_site, SameSite::Strict);
}

#[test]
fn test_settings_with_short_key_fail_at_manager() {
    let settings = SessionSettings::from_json(r#"{"secretKey": "short"}"#).unwrap();
    let result = SessionManager::new(settings.into_config().unwrap());
    assert!(matches!(result, Err(SessionError::Config(_))));
}

// ─── Concurrency ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_manager() {
    let manager = Arc::new(
        SessionManager::new(
            SessionConfig::dev(KEY.to_vec()).with_rotation_interval(Duration::from_secs(1)),
        )
        .unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..32 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let mut session = manager.load(None).await;
            session.insert("worker", i).unwrap();
            let cookie = manager.save(&mut session).await.unwrap();
            let loaded = manager.load(Some(cookie.value.as_str())).await;
            assert_eq!(loaded.get_i64("worker"), Some(i));
            loaded.id().to_string()
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 32);
}

#[tokio::test]
async fn test_last_writer_wins() {
    let manager = test_manager();
    let mut session = manager.load(None).await;
    let cookie = manager.save(&mut session).await.unwrap();

    let mut a = manager.load(Some(cookie.value.as_str())).await;
    let mut b = manager.load(Some(cookie.value.as_str())).await;
    a.insert("writer", "a").unwrap();
    b.insert("writer", "b").unwrap();

    let _ = manager.save(&mut a).await.unwrap();
    let last = manager.save(&mut b).await.unwrap();

    let loaded = manager.load(Some(last.value.as_str())).await;
    assert_eq!(loaded.get_str("writer"), Some("b"));
}

#[test]
fn test_blocking_adapter_usage() {
    let manager = test_manager();

    let cookie = tokio_test::block_on(async {
        let mut session = manager.load(None).await;
        session.insert("sync", true).unwrap();
        manager.save(&mut session).await.unwrap()
    });

    let session = tokio_test::block_on(manager.load_from_header(Some(
        format!("sessionx={}", cookie.value).as_str(),
    )));
    assert_eq!(session.get_bool("sync"), Some(true));
}
