//! Cached Mantis client that wraps the transport client with transparent
//! caching and exposes the full gateway surface.

use chrono::Duration;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::cache::{CacheLayer, MemoryStore};
use crate::config::Config;
use crate::discovery;
use crate::error::Result;
use crate::stats::{self, AssignmentReport, GroupBy, Period, StatisticsReport};

use super::client::MantisClient;
use super::query::{IssueFilter, MantisQueryKey, AGGREGATION_PAGE_SIZE};
use super::types::{Issue, Project, User};

/// Mantis client with transparent caching support.
///
/// Wraps the underlying [`MantisClient`] and provides the same read API, but
/// short-circuits repeated requests through a fingerprint-keyed cache.
/// Construct one per gateway and pass it by reference; there is no global
/// instance.
#[derive(Clone)]
pub struct CachedMantisClient {
  inner: MantisClient,
  cache: CacheLayer<MemoryStore>,
}

impl CachedMantisClient {
  /// Create a new cached client. Fails with a configuration error when the
  /// base URL or credential is missing.
  pub fn new(config: &Config) -> Result<Self> {
    let inner = MantisClient::new(config)?;
    let cache = CacheLayer::new(MemoryStore::new())
      .with_ttl(Duration::seconds(config.cache.ttl_secs as i64))
      .with_enabled(config.cache.enabled);

    Ok(Self { inner, cache })
  }

  /// Search for issues matching the filter, with caching.
  pub async fn search_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
    let key = MantisQueryKey::IssueSearch(filter.clone());

    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        let filter = filter.clone();
        async move { inner.get_issues(&filter).await }
      })
      .await
  }

  /// Get a single issue by id, with caching.
  pub async fn get_issue(&self, issue_id: u64) -> Result<Issue> {
    let key = MantisQueryKey::IssueDetail { id: issue_id };

    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        async move { inner.get_issue(issue_id).await }
      })
      .await
  }

  /// Get a user by id, with caching.
  pub async fn get_user(&self, user_id: u64) -> Result<User> {
    let key = MantisQueryKey::UserDetail { id: user_id };

    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        async move { inner.get_user(user_id).await }
      })
      .await
  }

  /// Get a user by login name, with caching.
  pub async fn get_user_by_username(&self, username: &str) -> Result<User> {
    let key = MantisQueryKey::UserByName {
      name: username.to_string(),
    };

    self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        let username = username.to_string();
        async move { inner.get_user_by_username(&username).await }
      })
      .await
  }

  /// Get the user the configured credential belongs to, with caching.
  pub async fn current_user(&self) -> Result<User> {
    self
      .cache
      .fetch(&MantisQueryKey::CurrentUser, || {
        let inner = self.inner.clone();
        async move { inner.current_user().await }
      })
      .await
  }

  /// Get all projects visible to the credential, with caching.
  pub async fn get_projects(&self) -> Result<Vec<Project>> {
    self
      .cache
      .fetch(&MantisQueryKey::Projects, || {
        let inner = self.inner.clone();
        async move { inner.get_projects().await }
      })
      .await
  }

  /// Enumerate users by sequential id probing.
  ///
  /// The upstream has no bulk listing endpoint, so this issues one lookup
  /// per id until ten consecutive ids are missing. Expensive on large id
  /// spaces, and it under-reports spaces with gaps longer than ten ids; see
  /// [`discovery::probe_users`].
  pub async fn discover_users(&self) -> Result<Vec<User>> {
    warn!("discovering users by sequential id probing; one request per id");

    let client = self.clone();
    discovery::probe_users(move |id| {
      let client = client.clone();
      async move { client.get_user(id).await }
    })
    .await
  }

  /// Grouped issue statistics for the chosen dimension and time window.
  pub async fn issue_statistics(
    &self,
    project_id: Option<u64>,
    group_by: GroupBy,
    period: Period,
  ) -> Result<StatisticsReport> {
    info!(%group_by, %period, "computing issue statistics");

    let filter = IssueFilter {
      project_id,
      page_size: Some(AGGREGATION_PAGE_SIZE),
      ..Default::default()
    };
    let issues = self.search_issues(&filter).await?;

    stats::grouped_statistics(&issues, group_by, period, chrono::Local::now())
  }

  /// Per-assignee workload report, optionally restricted to a status set.
  pub async fn assignment_statistics(
    &self,
    project_id: Option<u64>,
    include_unassigned: bool,
    status_filter: &[u64],
  ) -> Result<AssignmentReport> {
    info!(include_unassigned, "computing assignment statistics");

    let filter = IssueFilter {
      project_id,
      page_size: Some(AGGREGATION_PAGE_SIZE),
      ..Default::default()
    };
    let issues = self.search_issues(&filter).await?;
    let issues = stats::filter_by_status_ids(issues, status_filter);

    // Resolve every distinct handler to a full identity before tallying.
    let mut handler_ids: Vec<u64> = issues
      .iter()
      .filter_map(|issue| issue.handler.as_ref().map(|h| h.id))
      .collect();
    handler_ids.sort_unstable();
    handler_ids.dedup();

    let mut users = HashMap::with_capacity(handler_ids.len());
    for id in handler_ids {
      let user = self.get_user(id).await?;
      users.insert(id, user);
    }

    Ok(stats::build_assignment_report(
      &issues,
      &users,
      include_unassigned,
    ))
  }

  /// Drop every cached response.
  pub fn clear_cache(&self) {
    info!("clearing response cache");
    self.cache.clear();
  }
}
