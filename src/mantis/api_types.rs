//! Serde-deserializable envelopes matching Mantis API responses.
//!
//! Mantis wraps issue and project payloads in a top-level array field;
//! per-user endpoints return the bare object.

use serde::Deserialize;

use super::types::{Issue, Project};

/// Envelope around `GET /issues` and `GET /issues/{id}` (which returns a
/// one-element array).
#[derive(Debug, Deserialize)]
pub struct IssuesResponse {
  #[serde(default)]
  pub issues: Vec<Issue>,
}

/// Envelope around `GET /projects`.
#[derive(Debug, Deserialize)]
pub struct ProjectsResponse {
  #[serde(default)]
  pub projects: Vec<Project>,
}
