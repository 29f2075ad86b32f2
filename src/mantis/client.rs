//! HTTP transport for the Mantis REST API.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::{GatewayError, Result};

use super::api_types::{IssuesResponse, ProjectsResponse};
use super::query::IssueFilter;
use super::types::{Issue, Project, User};

/// Mantis API client wrapper.
///
/// Attaches the static credential header, applies the configured timeout,
/// and folds every transport failure into [`GatewayError`].
#[derive(Clone)]
pub struct MantisClient {
  http: reqwest::Client,
  base_url: url::Url,
}

impl MantisClient {
  pub fn new(config: &Config) -> Result<Self> {
    config.validate()?;
    let token = Config::get_api_token()?;

    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&token).map_err(|_| {
      GatewayError::Configuration("API token contains characters not valid in a header".to_string())
    })?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .connect_timeout(config.timeout())
      .timeout(config.timeout())
      .build()
      .map_err(|e| GatewayError::Request(format!("failed to build HTTP client: {}", e)))?;

    let base_url = url::Url::parse(&config.mantis.url)
      .map_err(|e| GatewayError::Configuration(format!("invalid Mantis URL: {}", e)))?;

    Ok(Self { http, base_url })
  }

  /// Build an endpoint URL from path segments. Segments are percent-encoded
  /// individually, so user-supplied names cannot break out of the path.
  fn endpoint(&self, segments: &[&str]) -> Result<url::Url> {
    let mut url = self.base_url.clone();
    {
      let mut path = url
        .path_segments_mut()
        .map_err(|_| GatewayError::Configuration("Mantis URL cannot serve as a base".to_string()))?;
      path.pop_if_empty();
      for segment in segments {
        path.push(segment);
      }
    }
    Ok(url)
  }

  /// Perform a GET and decode the JSON body.
  ///
  /// Failure classification, in priority order: a non-2xx response becomes
  /// `Upstream`; a request that got no response at all (connect failure or
  /// timeout) becomes `NoResponse`; anything that prevented the request from
  /// being built or its body from being decoded becomes `Request`.
  async fn get_json<T: DeserializeOwned>(
    &self,
    segments: &[&str],
    query: &[(&str, String)],
  ) -> Result<T> {
    let url = self.endpoint(segments)?;
    debug!(%url, "GET");

    let mut request = self.http.get(url);
    if !query.is_empty() {
      request = request.query(query);
    }

    let response = request.send().await.map_err(classify_send_error)?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(GatewayError::Upstream {
        status: status.as_u16(),
        body,
      });
    }

    response
      .json::<T>()
      .await
      .map_err(|e| GatewayError::Request(format!("failed to decode response body: {}", e)))
  }

  /// List issues matching the filter.
  pub async fn get_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
    let response: IssuesResponse = self.get_json(&["issues"], &filter.request_pairs()).await?;
    Ok(response.issues)
  }

  /// Get a single issue by id. Mantis wraps the result in a one-element
  /// `issues` array.
  pub async fn get_issue(&self, issue_id: u64) -> Result<Issue> {
    let response: IssuesResponse = self
      .get_json(&["issues", &issue_id.to_string()], &[])
      .await?;

    response
      .issues
      .into_iter()
      .next()
      .ok_or_else(|| GatewayError::Request(format!("upstream returned no issue for id {}", issue_id)))
  }

  /// Get a user by id.
  pub async fn get_user(&self, user_id: u64) -> Result<User> {
    self.get_json(&["users", &user_id.to_string()], &[]).await
  }

  /// Get a user by login name.
  pub async fn get_user_by_username(&self, username: &str) -> Result<User> {
    self.get_json(&["users", "username", username], &[]).await
  }

  /// Get the user the credential belongs to.
  pub async fn current_user(&self) -> Result<User> {
    self.get_json(&["users", "me"], &[]).await
  }

  /// List projects visible to the credential.
  pub async fn get_projects(&self) -> Result<Vec<Project>> {
    let response: ProjectsResponse = self.get_json(&["projects"], &[]).await?;
    Ok(response.projects)
  }
}

/// Classify a send failure: the request went out but nothing came back, or
/// it could not be sent at all.
fn classify_send_error(err: reqwest::Error) -> GatewayError {
  if err.is_timeout() || err.is_connect() {
    GatewayError::NoResponse
  } else {
    GatewayError::Request(err.to_string())
  }
}
