//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;

use super::store::CacheStore;
use super::traits::QueryKey;

/// Cache layer that manages caching logic and network fetching.
///
/// This is the single entry point used by all read operations: look up the
/// request fingerprint, return a fresh cached value when present, otherwise
/// run the fetcher and store its result.
pub struct CacheLayer<S: CacheStore> {
  store: Arc<S>,
  /// How long before a cached value is considered expired
  ttl: Duration,
  /// When false, every call goes straight to the fetcher
  enabled: bool,
}

impl<S: CacheStore> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(store: S) -> Self {
    Self {
      store: Arc::new(store),
      ttl: Duration::minutes(5),
      enabled: true,
    }
  }

  /// Set the time-to-live for cached values.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Enable or disable caching entirely.
  pub fn with_enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  /// A stored value is valid while `now - stored_at < ttl`.
  fn is_expired(&self, stored_at: DateTime<Utc>) -> bool {
    Utc::now() - stored_at >= self.ttl
  }

  /// Fetch a value through the cache.
  ///
  /// With caching disabled the fetcher runs unconditionally and the store is
  /// never touched. Otherwise a valid hit short-circuits without any network
  /// call; a miss or expired entry runs the fetcher and overwrites the entry.
  /// Fetcher errors propagate unchanged and are never cached.
  ///
  /// Two concurrent calls racing on the same fingerprint may both hit the
  /// network; the second write wins. There is no single-flight de-duplication.
  pub async fn fetch<T, K, F, Fut>(&self, key: &K, fetcher: F) -> Result<T>
  where
    T: Serialize + DeserializeOwned,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    if !self.enabled {
      return fetcher().await;
    }

    let fingerprint = key.cache_hash();

    if let Some(entry) = self.store.get(&fingerprint) {
      if !self.is_expired(entry.stored_at) {
        match serde_json::from_value::<T>(entry.value) {
          Ok(value) => {
            debug!(request = %key.description(), "cache hit");
            return Ok(value);
          }
          // Entry written by an incompatible version of the value type;
          // treat as a miss and refetch.
          Err(e) => debug!(request = %key.description(), error = %e, "discarding undecodable cache entry"),
        }
      }
    }

    debug!(request = %key.description(), "cache miss, fetching from upstream");
    let data = fetcher().await?;

    match serde_json::to_value(&data) {
      Ok(value) => self.store.set(&fingerprint, value),
      Err(e) => debug!(request = %key.description(), error = %e, "value not serializable, skipping cache"),
    }

    Ok(data)
  }

  /// Empty the underlying store.
  pub fn clear(&self) {
    self.store.clear();
  }
}

impl<S: CacheStore> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      ttl: self.ttl,
      enabled: self.enabled,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use crate::error::GatewayError;
  use std::sync::atomic::{AtomicU32, Ordering};

  struct TestKey(&'static str);

  impl QueryKey for TestKey {
    fn cache_hash(&self) -> String {
      self.0.to_string()
    }

    fn description(&self) -> String {
      self.0.to_string()
    }
  }

  #[tokio::test]
  async fn second_fetch_within_ttl_skips_fetcher() {
    let layer = CacheLayer::new(MemoryStore::new());
    let calls = AtomicU32::new(0);
    let key = TestKey("issues");

    for _ in 0..2 {
      let value: u32 = layer
        .fetch(&key, || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(7)
        })
        .await
        .expect("fetch should succeed");
      assert_eq!(value, 7);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn expired_entry_is_refetched() {
    let layer = CacheLayer::new(MemoryStore::new()).with_ttl(Duration::zero());
    let calls = AtomicU32::new(0);
    let key = TestKey("issues");

    for _ in 0..2 {
      let _: u32 = layer
        .fetch(&key, || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(7)
        })
        .await
        .expect("fetch should succeed");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn disabled_layer_always_invokes_fetcher() {
    let layer = CacheLayer::new(MemoryStore::new()).with_enabled(false);
    let calls = AtomicU32::new(0);
    let key = TestKey("projects");

    for _ in 0..3 {
      let _: u32 = layer
        .fetch(&key, || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(1)
        })
        .await
        .expect("fetch should succeed");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn fetcher_errors_propagate_and_are_not_cached() {
    let layer = CacheLayer::new(MemoryStore::new());
    let calls = AtomicU32::new(0);
    let key = TestKey("user");

    let result: Result<u32> = layer
      .fetch(&key, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(GatewayError::NoResponse)
      })
      .await;
    assert!(matches!(result, Err(GatewayError::NoResponse)));

    // The failure must not have been stored; the next call fetches again.
    let value: u32 = layer
      .fetch(&key, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(9)
      })
      .await
      .expect("fetch should succeed");

    assert_eq!(value, 9);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn distinct_keys_do_not_share_entries() {
    let layer = CacheLayer::new(MemoryStore::new());
    let calls = AtomicU32::new(0);

    let a: u32 = layer
      .fetch(&TestKey("a"), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(1)
      })
      .await
      .expect("fetch should succeed");
    let b: u32 = layer
      .fetch(&TestKey("b"), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(2)
      })
      .await
      .expect("fetch should succeed");

    assert_eq!((a, b), (1, 2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn clear_drops_cached_entries() {
    let layer = CacheLayer::new(MemoryStore::new());
    let calls = AtomicU32::new(0);
    let key = TestKey("issue-detail");

    let _: u32 = layer
      .fetch(&key, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(1)
      })
      .await
      .expect("fetch should succeed");

    layer.clear();

    let _: u32 = layer
      .fetch(&key, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(1)
      })
      .await
      .expect("fetch should succeed");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
