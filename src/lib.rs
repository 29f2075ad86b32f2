//! A cached gateway for the Mantis bug tracker REST API.
//!
//! Wraps the upstream REST surface behind a small set of read operations:
//! filtered issue listings, issue/user/project lookups, sequential user
//! discovery, and aggregation reports, with fingerprint-keyed response
//! caching and a single tagged error taxonomy.

pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod mantis;
pub mod payload;
pub mod stats;

pub use config::Config;
pub use error::{GatewayError, Result};
pub use mantis::CachedMantisClient;
