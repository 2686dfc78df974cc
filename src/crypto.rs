//! Token sealing for session cookies
//!
//! Tokens are `base64url(nonce || ciphertext || tag)` without padding.
//! The AES variant is chosen by key length: 16, 24 or 32 bytes select
//! AES-128-GCM, AES-192-GCM or AES-256-GCM. Every seal draws a fresh
//! 96-bit nonce from the OS random source.

use crate::error::{Result, SessionError};
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64;
use base64::Engine;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// Random bytes in a session id
const SESSION_ID_BYTES: usize = 16;

/// AES-GCM cipher keyed from the configured secret
#[derive(Clone)]
pub enum SessionCipher {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl std::fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.algorithm())
    }
}

impl SessionCipher {
    /// Build a cipher from a 16/24/32-byte key
    pub fn new(key: &[u8]) -> Result<Self> {
        let invalid = |_| SessionError::Config(format!("Invalid key of {} bytes", key.len()));
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key).map(Self::Aes128).map_err(invalid),
            24 => Aes192Gcm::new_from_slice(key).map(Self::Aes192).map_err(invalid),
            32 => Aes256Gcm::new_from_slice(key).map(Self::Aes256).map_err(invalid),
            n => Err(SessionError::Config(format!(
                "Secret key must be 16, 24, or 32 bytes, got {}",
                n
            ))),
        }
    }

    /// Algorithm name, for diagnostics
    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Aes128(_) => "AES-128-GCM",
            Self::Aes192(_) => "AES-192-GCM",
            Self::Aes256(_) => "AES-256-GCM",
        }
    }

    /// Encrypt `plaintext` into a cookie-safe token
    pub fn seal(&self, plaintext: &[u8]) -> Result<String> {
        // Nonce size is U12 for all three variants
        let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
        let ciphertext = match self {
            Self::Aes128(c) => c.encrypt(&nonce, plaintext),
            Self::Aes192(c) => c.encrypt(&nonce, plaintext),
            Self::Aes256(c) => c.encrypt(&nonce, plaintext),
        }
        .map_err(|e| SessionError::Encryption(e.to_string()))?;

        let mut token = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(token))
    }

    /// Decrypt a token produced by [`seal`](Self::seal)
    pub fn open(&self, token: &str) -> Result<Vec<u8>> {
        let raw = BASE64
            .decode(token)
            .map_err(|e| SessionError::Decryption(format!("Invalid token encoding: {}", e)))?;
        if raw.len() < NONCE_LEN {
            return Err(SessionError::Decryption(format!(
                "Token too short: {} bytes",
                raw.len()
            )));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce);
        match self {
            Self::Aes128(c) => c.decrypt(nonce, ciphertext),
            Self::Aes192(c) => c.decrypt(nonce, ciphertext),
            Self::Aes256(c) => c.decrypt(nonce, ciphertext),
        }
        .map_err(|_| SessionError::Decryption("Authentication failed".to_string()))
    }
}

/// Generate a new session id: 128 random bits, base64url without padding
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

/// True if `id` uses only the base64url alphabet
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
