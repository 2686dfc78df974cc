//! Per-visitor session state
//!
//! A `Session` is owned by exactly one request. It carries an opaque id,
//! a JSON data bag, lifecycle timestamps, and a read-once flash sub-bag
//! stored under a reserved key that normal data access never sees.

use crate::error::{Result, SessionError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved data key holding pending flash messages
pub const FLASH_KEY: &str = "_flashes";

/// Mutable per-visitor session state
///
/// Serialized as camelCase JSON: `{"id","data","createdAt","updatedAt","rotatedAt"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: String,

    #[serde(default)]
    data: Map<String, Value>,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,

    rotated_at: DateTime<Utc>,

    /// Id this session carried before its last rotation, until saved
    #[serde(skip)]
    previous_id: Option<String>,
}

impl Session {
    pub(crate) fn new(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            data: Map::new(),
            created_at: now,
            updated_at: now,
            rotated_at: now,
            previous_id: None,
        }
    }

    /// Opaque session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the session was first minted
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the session was last saved
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// When the session id was last rotated
    pub fn rotated_at(&self) -> DateTime<Utc> {
        self.rotated_at
    }

    pub(crate) fn previous_id(&self) -> Option<&str> {
        self.previous_id.as_deref()
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub(crate) fn replace_id(&mut self, id: String, now: DateTime<Utc>) {
        let old = std::mem::replace(&mut self.id, id);
        // Keep the id that is actually persisted, not an intermediate one
        if self.previous_id.is_none() {
            self.previous_id = Some(old);
        }
        self.rotated_at = now;
        if self.updated_at < now {
            self.updated_at = now;
        }
    }

    pub(crate) fn clear_previous_id(&mut self) {
        self.previous_id = None;
    }

    // ------------------------------------------------------------------
    // Data bag
    // ------------------------------------------------------------------

    /// Get a raw value
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        if key == FLASH_KEY {
            return None;
        }
        self.data.get(key)
    }

    /// Get a value deserialized into `T`
    ///
    /// Returns `None` if the key is absent or the stored value does not
    /// deserialize into `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_value(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get a string value
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get_value(key).and_then(Value::as_str)
    }

    /// Get a boolean value
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_value(key).and_then(Value::as_bool)
    }

    /// Get an integer value
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_value(key).and_then(Value::as_i64)
    }

    /// Get a floating point value (integers are widened)
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get_value(key).and_then(Value::as_f64)
    }

    /// Insert a value, replacing any previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Serialize) -> Result<()> {
        let key = key.into();
        if key == FLASH_KEY {
            return Err(SessionError::ReservedKey(key));
        }
        let value = serde_json::to_value(value)?;
        self.data.insert(key, value);
        Ok(())
    }

    /// Remove a value, returning it if present
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if key == FLASH_KEY {
            return None;
        }
        self.data.remove(key)
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// Iterate over user-visible keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data
            .keys()
            .map(String::as_str)
            .filter(|k| *k != FLASH_KEY)
    }

    /// Number of user-visible entries
    pub fn len(&self) -> usize {
        self.data.len() - usize::from(self.data.contains_key(FLASH_KEY))
    }

    /// True when no user-visible entries exist
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all user-visible entries; pending flashes survive
    pub fn clear(&mut self) {
        self.data.retain(|k, _| k == FLASH_KEY);
    }

    // ------------------------------------------------------------------
    // Flash messages
    // ------------------------------------------------------------------

    /// Add a flash message, overwriting any message in the same category
    pub fn add_flash(&mut self, category: impl Into<String>, message: impl Into<Value>) {
        let entry = self
            .data
            .entry(FLASH_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(flashes) = entry {
            flashes.insert(category.into(), message.into());
        }
    }

    /// Take a flash message, consuming it
    pub fn get_flash(&mut self, category: &str) -> Option<Value> {
        let Some(Value::Object(flashes)) = self.data.get_mut(FLASH_KEY) else {
            return None;
        };
        let message = flashes.remove(category);
        if flashes.is_empty() {
            self.data.remove(FLASH_KEY);
        }
        message
    }

    /// Take all flash messages, leaving none behind
    pub fn get_flashes(&mut self) -> Map<String, Value> {
        match self.data.remove(FLASH_KEY) {
            Some(Value::Object(flashes)) => flashes,
            _ => Map::new(),
        }
    }

    /// Check for a flash message without consuming it
    pub fn has_flash(&self, category: &str) -> bool {
        self.data
            .get(FLASH_KEY)
            .and_then(Value::as_object)
            .is_some_and(|flashes| flashes.contains_key(category))
    }
}
