//! Session cookie directives
//!
//! `SessionCookie` is what `SessionManager::save` and `destroy` hand back to
//! the HTTP adapter: its `Display` output is a ready `Set-Cookie` value.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `SameSite` cookie attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lax => "Lax",
            Self::Strict => "Strict",
            Self::None => "None",
        })
    }
}

impl FromStr for SameSite {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lax" => Ok(Self::Lax),
            "strict" => Ok(Self::Strict),
            "none" => Ok(Self::None),
            other => Err(SessionError::Config(format!(
                "Unknown SameSite policy '{}'",
                other
            ))),
        }
    }
}

/// Outbound cookie produced by a save or destroy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub domain: Option<String>,
    /// `Max-Age` in seconds; `None` for a browser-session cookie
    pub max_age: Option<i64>,
    /// Fixed `Expires` date, only set when clearing
    pub expires: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

impl SessionCookie {
    /// Turn this cookie into one that deletes itself on the client
    pub(crate) fn into_removal(mut self) -> Self {
        self.value.clear();
        self.max_age = Some(0);
        self.expires = Some(EPOCH_EXPIRES.to_string());
        self
    }

    /// True if this directive clears the cookie
    pub fn is_removal(&self) -> bool {
        self.max_age == Some(0)
    }

    /// Render as a `Set-Cookie` header value
    pub fn to_header_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; Path={}", self.name, self.value, self.path)?;
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", domain)?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if let Some(expires) = &self.expires {
            write!(f, "; Expires={}", expires)?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        write!(f, "; SameSite={}", self.same_site)
    }
}

/// Extract a cookie value by name from a request `Cookie` header
///
/// Returns the first non-empty match.
pub fn parse_cookie_header<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| k.trim() == name && !v.trim().is_empty())
        .map(|(_, v)| v.trim().trim_matches('"'))
}
