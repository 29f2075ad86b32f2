//! Serde-typed representations of Mantis REST entities.
//!
//! All of these are transient snapshots reconstructed on every upstream
//! call; the gateway never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An id/name pair, as Mantis renders statuses, categories, priorities,
/// severities and access levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
  pub id: u64,
  pub name: String,
}

/// User identity embedded in an issue (reporter or handler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub email: String,
}

/// A single issue snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
  pub id: u64,
  pub summary: String,
  #[serde(default)]
  pub description: String,
  pub status: NamedRef,
  pub project: NamedRef,
  pub category: NamedRef,
  pub reporter: UserRef,
  pub handler: Option<UserRef>,
  pub priority: Option<NamedRef>,
  pub severity: Option<NamedRef>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A tracker account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub email: String,
  pub real_name: Option<String>,
  pub access_level: Option<NamedRef>,
  pub enabled: Option<bool>,
}

/// A project summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub enabled: bool,
  pub status: NamedRef,
}
