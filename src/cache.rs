//! Response cache — call-key canonicalization and the memo store.
//!
//! Every dispatch is addressed by a [`CallKey`] derived from the command
//! name plus whichever of params/body is non-empty. The key is a pure
//! function of its inputs (sorted key-value pairs, not map identity), so
//! structurally equal invocations share one cache slot and one poll slot.
//!
//! Entries live for the whole process. Nothing expires by age; staleness
//! is the caller's concern.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::{Body, Params};

// ── Call key ─────────────────────────────────────────────────────────────────

/// Addressing unit for cache entries and polls: one per (command, scope).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallKey {
    command: String,
    scope: KeyScope,
}

/// Which of the three mutually exclusive key forms applies, holding the
/// canonical rendering of the chosen mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyScope {
    Params(String),
    Body(String),
    Singleton,
}

impl CallKey {
    /// Derive the key for one invocation.
    ///
    /// Precedence: non-empty `params` wins, then non-empty `body`, then the
    /// command name alone (singleton slot). Exactly one form applies.
    pub fn derive(command: &str, params: &Params, body: &Body) -> Self {
        // Both components are rendered as JSON, so separator characters
        // inside a key or value cannot collide with the pair structure.
        let scope = if !params.is_empty() {
            let canonical = params
                .iter()
                .map(|(k, v)| {
                    format!("{}={}", Value::String(k.clone()), Value::String(v.clone()))
                })
                .collect::<Vec<_>>()
                .join("&");
            KeyScope::Params(canonical)
        } else if !body.is_empty() {
            // Sort explicitly rather than relying on the map's iteration
            // order, so the key stays stable across serde_json features.
            let mut pairs: Vec<(&String, &Value)> = body.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let canonical = pairs
                .iter()
                .map(|(k, v)| format!("{}={v}", Value::String((*k).clone())))
                .collect::<Vec<_>>()
                .join("&");
            KeyScope::Body(canonical)
        } else {
            KeyScope::Singleton
        };
        Self { command: command.to_string(), scope }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

// ── Cache entry ──────────────────────────────────────────────────────────────

/// One memoized result: the unwrapped payload plus when it was fetched.
///
/// Serializes straight into the wire shape: `data` as-is, `fetchedAt` as
/// unix-epoch milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub data: Value,
    #[serde(rename = "fetchedAt", with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(data: Value) -> Self {
        Self { data, fetched_at: Utc::now() }
    }

    /// Wire-shaped `{data, fetchedAt}` envelope, the uniform result shape
    /// delivered by the cache-aware accessor.
    pub fn to_value(&self) -> Value {
        // A Value plus an i64 always serializes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

/// Process-lifetime memo store, one entry per [`CallKey`].
///
/// A plain `Mutex<HashMap>` is enough: the lock is never held across an
/// await, and within one key whichever dispatch completes last in
/// wall-clock time wins.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: Mutex<HashMap<CallKey, CacheEntry>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the entry for `key` with a fresh result.
    pub fn insert(&self, key: CallKey, entry: CacheEntry) -> Result<(), Error> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Cache("cache lock poisoned".into()))?;
        entries.insert(key, entry);
        Ok(())
    }

    /// Fetch the entry for `key`, if a prior dispatch populated it.
    pub fn get(&self, key: &CallKey) -> Result<Option<CacheEntry>, Error> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Cache("cache lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }
}
