//! Core traits for the caching system.

/// Trait for request keys that identify a logically unique upstream call.
///
/// Implementors must produce a deterministic fingerprint: two logically
/// identical requests hash identically, and any differing filter value
/// changes the hash.
pub trait QueryKey {
  /// Canonical fingerprint string, used as the cache index.
  fn cache_hash(&self) -> String;

  /// Human-readable description for logging.
  fn description(&self) -> String;
}
