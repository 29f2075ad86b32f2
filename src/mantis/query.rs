//! Query composition and request fingerprinting for Mantis API calls.

use sha2::{Digest, Sha256};

use crate::cache::QueryKey;

/// Default page size for issue listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Page size used when fetching issues for aggregation reports.
pub const AGGREGATION_PAGE_SIZE: u32 = 1000;

/// Multi-field filter for issue listings.
///
/// Every field is optional; pagination is 1-based and defaults to page 1
/// with [`DEFAULT_PAGE_SIZE`] issues per page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
  pub project_id: Option<u64>,
  pub status_id: Option<u64>,
  pub handler_id: Option<u64>,
  pub reporter_id: Option<u64>,
  pub priority: Option<u64>,
  pub severity: Option<u64>,
  /// Free-text search
  pub search: Option<String>,
  pub page: Option<u32>,
  pub page_size: Option<u32>,
  /// Field-selection list forwarded to the upstream
  pub select: Option<Vec<String>>,
}

impl IssueFilter {
  pub fn effective_page(&self) -> u32 {
    self.page.unwrap_or(1)
  }

  pub fn effective_page_size(&self) -> u32 {
    self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
  }

  /// Field-selection list normalized for fingerprinting: trimmed, sorted,
  /// deduplicated.
  fn normalized_select(&self) -> Option<String> {
    let fields = self.select.as_ref()?;
    let mut fields: Vec<String> = fields
      .iter()
      .map(|f| f.trim().to_string())
      .filter(|f| !f.is_empty())
      .collect();
    if fields.is_empty() {
      return None;
    }
    fields.sort_unstable();
    fields.dedup();
    Some(fields.join(","))
  }

  /// Canonical pair list in fixed alphabetical order by wire name, with
  /// absent fields and implicit defaults omitted entirely. A filter with
  /// `page = Some(1)` must fingerprint identically to one with `page`
  /// omitted.
  fn canonical_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();

    if let Some(v) = self.handler_id {
      pairs.push(("handler_id", v.to_string()));
    }
    let page = self.effective_page();
    if page != 1 {
      pairs.push(("page", page.to_string()));
    }
    let page_size = self.effective_page_size();
    if page_size != DEFAULT_PAGE_SIZE {
      pairs.push(("pageSize", page_size.to_string()));
    }
    if let Some(v) = self.priority {
      pairs.push(("priority", v.to_string()));
    }
    if let Some(v) = self.project_id {
      pairs.push(("project_id", v.to_string()));
    }
    if let Some(v) = self.reporter_id {
      pairs.push(("reporter_id", v.to_string()));
    }
    if let Some(v) = self.search.as_deref().filter(|s| !s.is_empty()) {
      pairs.push(("search", v.to_string()));
    }
    if let Some(v) = self.normalized_select() {
      pairs.push(("select", v));
    }
    if let Some(v) = self.severity {
      pairs.push(("severity", v.to_string()));
    }
    if let Some(v) = self.status_id {
      pairs.push(("status_id", v.to_string()));
    }

    pairs
  }

  /// Query pairs actually sent upstream. Unlike the fingerprint input,
  /// pagination is always explicit here.
  pub(crate) fn request_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
      ("page", self.effective_page().to_string()),
      ("pageSize", self.effective_page_size().to_string()),
    ];

    for (name, value) in self.canonical_pairs() {
      if name != "page" && name != "pageSize" {
        pairs.push((name, value));
      }
    }

    pairs
  }
}

// ============================================================================
// Query key types
// ============================================================================

/// Query key types for Mantis API calls.
#[derive(Clone, Debug)]
pub enum MantisQueryKey {
  /// Filtered issue listing
  IssueSearch(IssueFilter),
  /// Single issue by id
  IssueDetail { id: u64 },
  /// Single user by id
  UserDetail { id: u64 },
  /// Single user by login name
  UserByName { name: String },
  /// The authenticated user
  CurrentUser,
  /// Project listing
  Projects,
}

impl QueryKey for MantisQueryKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::IssueSearch(filter) => {
        let pairs: Vec<String> = filter
          .canonical_pairs()
          .into_iter()
          .map(|(name, value)| format!("{}={}", name, value))
          .collect();
        format!("issue_search:{}", pairs.join("&"))
      }
      Self::IssueDetail { id } => format!("issue_detail:{}", id),
      Self::UserDetail { id } => format!("user_detail:{}", id),
      Self::UserByName { name } => format!("user_by_name:{}", normalize_username(name)),
      Self::CurrentUser => "current_user".to_string(),
      Self::Projects => "projects".to_string(),
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
  }

  fn description(&self) -> String {
    match self {
      Self::IssueSearch(filter) => format!("issues: {:?}", filter),
      Self::IssueDetail { id } => format!("issue {}", id),
      Self::UserDetail { id } => format!("user {}", id),
      Self::UserByName { name } => format!("user '{}'", name),
      Self::CurrentUser => "current user".to_string(),
      Self::Projects => "all projects".to_string(),
    }
  }
}

/// Normalize a login name for consistent hashing. Mantis logins are
/// case-insensitive.
fn normalize_username(name: &str) -> String {
  name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identical_filters_hash_identically() {
    let a = MantisQueryKey::IssueSearch(IssueFilter {
      project_id: Some(4),
      status_id: Some(80),
      search: Some("crash".to_string()),
      ..Default::default()
    });
    let b = MantisQueryKey::IssueSearch(IssueFilter {
      search: Some("crash".to_string()),
      status_id: Some(80),
      project_id: Some(4),
      ..Default::default()
    });

    assert_eq!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn default_pagination_is_elided_from_the_fingerprint() {
    let implicit = MantisQueryKey::IssueSearch(IssueFilter {
      project_id: Some(4),
      ..Default::default()
    });
    let explicit = MantisQueryKey::IssueSearch(IssueFilter {
      project_id: Some(4),
      page: Some(1),
      page_size: Some(DEFAULT_PAGE_SIZE),
      ..Default::default()
    });

    assert_eq!(implicit.cache_hash(), explicit.cache_hash());
  }

  #[test]
  fn any_differing_filter_value_changes_the_hash() {
    let base = IssueFilter {
      project_id: Some(4),
      ..Default::default()
    };
    let base_key = MantisQueryKey::IssueSearch(base.clone());

    let variations = [
      IssueFilter {
        project_id: Some(5),
        ..base.clone()
      },
      IssueFilter {
        status_id: Some(10),
        ..base.clone()
      },
      IssueFilter {
        page: Some(2),
        ..base.clone()
      },
      IssueFilter {
        page_size: Some(50),
        ..base.clone()
      },
      IssueFilter {
        search: Some("panic".to_string()),
        ..base.clone()
      },
    ];

    for variation in variations {
      let key = MantisQueryKey::IssueSearch(variation.clone());
      assert_ne!(
        base_key.cache_hash(),
        key.cache_hash(),
        "variation should change the hash: {:?}",
        variation
      );
    }
  }

  #[test]
  fn select_list_is_order_insensitive() {
    let a = MantisQueryKey::IssueSearch(IssueFilter {
      select: Some(vec!["id".to_string(), "summary".to_string()]),
      ..Default::default()
    });
    let b = MantisQueryKey::IssueSearch(IssueFilter {
      select: Some(vec!["summary".to_string(), " id ".to_string()]),
      ..Default::default()
    });

    assert_eq!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn operation_kinds_never_collide() {
    let issue = MantisQueryKey::IssueDetail { id: 7 };
    let user = MantisQueryKey::UserDetail { id: 7 };
    assert_ne!(issue.cache_hash(), user.cache_hash());
  }

  #[test]
  fn username_lookup_is_case_insensitive() {
    let a = MantisQueryKey::UserByName {
      name: "VBoctor".to_string(),
    };
    let b = MantisQueryKey::UserByName {
      name: " vboctor ".to_string(),
    };
    assert_eq!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn request_pairs_always_carry_pagination() {
    let filter = IssueFilter {
      project_id: Some(4),
      ..Default::default()
    };

    let pairs = filter.request_pairs();
    assert_eq!(pairs[0], ("page", "1".to_string()));
    assert_eq!(pairs[1], ("pageSize", "20".to_string()));
    assert!(pairs.contains(&("project_id", "4".to_string())));
  }
}
