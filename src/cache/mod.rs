//! Generic caching layer for upstream responses.
//!
//! This module provides a tracker-agnostic caching mechanism that:
//! - Maps a request fingerprint to a stored JSON value plus timestamp
//! - Expires entries lazily after a configurable TTL (no background sweep)
//! - Never evicts otherwise; entries are overwritten on refresh or dropped
//!   wholesale by `clear()`

mod layer;
mod store;
mod traits;

pub use layer::CacheLayer;
pub use store::{CacheEntry, CacheStore, MemoryStore};
pub use traits::QueryKey;
