//! Mantis REST API access: transport client, caching wrapper, query
//! composition, and data types.

pub mod api_types;
pub mod cached_client;
pub mod client;
pub mod query;
pub mod types;

pub use cached_client::CachedMantisClient;
pub use client::MantisClient;
pub use query::{IssueFilter, MantisQueryKey, DEFAULT_PAGE_SIZE};
pub use types::{Issue, NamedRef, Project, User, UserRef};
