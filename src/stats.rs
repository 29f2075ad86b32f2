//! Aggregation of issue collections into grouped statistics and
//! per-assignee workload reports.
//!
//! Everything here is pure: the caller fetches the issue collection (and
//! resolves handler identities) and these functions derive a report from it.
//! Reports are recomputed per call and never cached as distinct entities.

use chrono::{DateTime, Datelike, Days, Local, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{GatewayError, Result};
use crate::mantis::types::{Issue, User};

/// Grouping dimension for issue statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
  Status,
  Priority,
  Severity,
  Handler,
  Reporter,
}

impl GroupBy {
  /// Grouping key for one issue. Missing handlers count as "unassigned";
  /// any other missing or empty name counts as "unknown".
  fn key_for(self, issue: &Issue) -> String {
    match self {
      GroupBy::Status => or_fallback(Some(issue.status.name.as_str()), "unknown"),
      GroupBy::Priority => or_fallback(issue.priority.as_ref().map(|p| p.name.as_str()), "unknown"),
      GroupBy::Severity => or_fallback(issue.severity.as_ref().map(|s| s.name.as_str()), "unknown"),
      GroupBy::Handler => or_fallback(
        issue.handler.as_ref().map(|h| h.name.as_str()),
        "unassigned",
      ),
      GroupBy::Reporter => or_fallback(Some(issue.reporter.name.as_str()), "unknown"),
    }
  }
}

impl fmt::Display for GroupBy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      GroupBy::Status => "status",
      GroupBy::Priority => "priority",
      GroupBy::Severity => "severity",
      GroupBy::Handler => "handler",
      GroupBy::Reporter => "reporter",
    };
    f.write_str(name)
  }
}

fn or_fallback(name: Option<&str>, fallback: &str) -> String {
  match name {
    Some(name) if !name.is_empty() => name.to_string(),
    _ => fallback.to_string(),
  }
}

/// Time window over issue creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Period {
  #[default]
  All,
  Today,
  Week,
  Month,
}

impl Period {
  /// Inclusive lower bound of the window in local time, `None` for `All`.
  /// Weeks start on Sunday.
  fn start(self, now: DateTime<Local>) -> Option<NaiveDateTime> {
    let today = now.date_naive();
    match self {
      Period::All => None,
      Period::Today => Some(today.and_time(NaiveTime::MIN)),
      Period::Week => {
        let days_into_week = u64::from(now.weekday().num_days_from_sunday());
        let sunday = today.checked_sub_days(Days::new(days_into_week)).unwrap_or(today);
        Some(sunday.and_time(NaiveTime::MIN))
      }
      Period::Month => Some(today.with_day(1).unwrap_or(today).and_time(NaiveTime::MIN)),
    }
  }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Period::All => "all",
      Period::Today => "today",
      Period::Week => "week",
      Period::Month => "month",
    };
    f.write_str(name)
  }
}

/// Keep the issues created inside the window.
fn filter_by_period<'a>(issues: &'a [Issue], period: Period, now: DateTime<Local>) -> Vec<&'a Issue> {
  match period.start(now) {
    None => issues.iter().collect(),
    Some(start) => issues
      .iter()
      .filter(|issue| issue.created_at.with_timezone(&Local).naive_local() >= start)
      .collect(),
  }
}

/// Keep the issues whose status id is in the allowed set. An empty set
/// means no filtering.
pub fn filter_by_status_ids(issues: Vec<Issue>, allowed: &[u64]) -> Vec<Issue> {
  if allowed.is_empty() {
    return issues;
  }
  issues
    .into_iter()
    .filter(|issue| allowed.contains(&issue.status.id))
    .collect()
}

/// Counts of issues per distinct grouping key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsReport {
  /// Number of issues fetched, before the period filter
  pub total: usize,
  pub grouped_by: GroupBy,
  pub period: Period,
  pub counts: BTreeMap<String, u64>,
}

/// Group issues by the chosen dimension inside the chosen window.
///
/// A window that matches nothing is reported as [`GatewayError::EmptyResult`]
/// rather than a zero-filled report.
pub fn grouped_statistics(
  issues: &[Issue],
  group_by: GroupBy,
  period: Period,
  now: DateTime<Local>,
) -> Result<StatisticsReport> {
  let filtered = filter_by_period(issues, period, now);
  if filtered.is_empty() {
    return Err(GatewayError::EmptyResult(format!(
      "no issues created in period '{}'",
      period
    )));
  }

  let mut counts: BTreeMap<String, u64> = BTreeMap::new();
  for issue in &filtered {
    *counts.entry(group_by.key_for(issue)).or_insert(0) += 1;
  }

  Ok(StatisticsReport {
    total: issues.len(),
    grouped_by: group_by,
    period,
    counts,
  })
}

/// Workload of a single assignee.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWorkload {
  pub id: u64,
  pub name: String,
  pub email: String,
  pub issue_count: u64,
  pub open_issues: u64,
  pub closed_issues: u64,
  /// Ids of the issues assigned to this user
  pub issues: Vec<u64>,
}

/// Per-assignee workload breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentReport {
  pub total_issues: u64,
  pub assigned_issues: u64,
  pub unassigned_issues: u64,
  pub user_statistics: Vec<UserWorkload>,
}

/// A status counts as closed when its name contains "closed" or "resolved",
/// case-insensitively. Everything else is open.
fn is_closed_status(name: &str) -> bool {
  let name = name.to_lowercase();
  name.contains("closed") || name.contains("resolved")
}

/// Partition issues by handler and tally workloads.
///
/// `users` maps handler ids to the full identities already resolved by the
/// caller; issues whose handler is absent from the map are skipped. Users
/// without a single issue are dropped. Real users sort by issue count
/// descending with ascending-id tie-break; the synthetic "unassigned" entry
/// (id 0, counted fully open) is appended last when requested and nonzero.
pub fn build_assignment_report(
  issues: &[Issue],
  users: &HashMap<u64, User>,
  include_unassigned: bool,
) -> AssignmentReport {
  let mut per_user: HashMap<u64, UserWorkload> = users
    .values()
    .map(|user| {
      (
        user.id,
        UserWorkload {
          id: user.id,
          name: user.name.clone(),
          email: user.email.clone(),
          issue_count: 0,
          open_issues: 0,
          closed_issues: 0,
          issues: Vec::new(),
        },
      )
    })
    .collect();

  let mut unassigned_count = 0u64;
  let mut unassigned_issues: Vec<u64> = Vec::new();

  for issue in issues {
    match issue.handler.as_ref().map(|h| h.id) {
      Some(handler_id) => {
        if let Some(workload) = per_user.get_mut(&handler_id) {
          workload.issue_count += 1;
          workload.issues.push(issue.id);
          if is_closed_status(&issue.status.name) {
            workload.closed_issues += 1;
          } else {
            workload.open_issues += 1;
          }
        }
      }
      None => {
        unassigned_count += 1;
        unassigned_issues.push(issue.id);
      }
    }
  }

  let mut user_statistics: Vec<UserWorkload> = per_user
    .into_values()
    .filter(|workload| workload.issue_count > 0)
    .collect();
  user_statistics.sort_by(|a, b| b.issue_count.cmp(&a.issue_count).then(a.id.cmp(&b.id)));

  if include_unassigned && unassigned_count > 0 {
    user_statistics.push(UserWorkload {
      id: 0,
      name: "unassigned".to_string(),
      email: String::new(),
      issue_count: unassigned_count,
      open_issues: unassigned_count,
      closed_issues: 0,
      issues: unassigned_issues,
    });
  }

  let total = issues.len() as u64;
  AssignmentReport {
    total_issues: total,
    assigned_issues: total - unassigned_count,
    unassigned_issues: unassigned_count,
    user_statistics,
  }
}
