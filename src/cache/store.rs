//! Cache storage backends.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// A cached value together with the moment it was stored.
///
/// Owned exclusively by the store; overwritten on refresh, never mutated in
/// place.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  /// The stored payload, opaque to the store
  pub value: serde_json::Value,
  /// When the payload was stored
  pub stored_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
pub trait CacheStore: Send + Sync {
  /// Look up the entry for a fingerprint.
  fn get(&self, fingerprint: &str) -> Option<CacheEntry>;

  /// Store (or overwrite) the entry for a fingerprint, stamped with the
  /// current time.
  fn set(&self, fingerprint: &str, value: serde_json::Value);

  /// Drop every entry.
  fn clear(&self);
}

/// In-memory cache store backed by a map guarded with a read/write lock.
///
/// Safe for concurrent use; the lock is never held across an await point.
#[derive(Default)]
pub struct MemoryStore {
  entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStore for MemoryStore {
  fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
    let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
    entries.get(fingerprint).cloned()
  }

  fn set(&self, fingerprint: &str, value: serde_json::Value) {
    let entry = CacheEntry {
      value,
      stored_at: Utc::now(),
    };
    let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
    entries.insert(fingerprint.to_string(), entry);
  }

  fn clear(&self) {
    let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
    entries.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn set_then_get_returns_entry() {
    let store = MemoryStore::new();
    store.set("abc", json!({"n": 1}));

    let entry = store.get("abc").expect("entry should exist");
    assert_eq!(entry.value, json!({"n": 1}));
    assert!(store.get("other").is_none());
  }

  #[test]
  fn set_overwrites_existing_entry() {
    let store = MemoryStore::new();
    store.set("abc", json!(1));
    store.set("abc", json!(2));

    let entry = store.get("abc").expect("entry should exist");
    assert_eq!(entry.value, json!(2));
  }

  #[test]
  fn clear_empties_the_store() {
    let store = MemoryStore::new();
    store.set("a", json!(1));
    store.set("b", json!(2));

    store.clear();

    assert!(store.get("a").is_none());
    assert!(store.get("b").is_none());
  }

}
