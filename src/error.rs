//! Error types for gateway operations.
//!
//! Every upstream failure is folded into a single tagged enum so callers can
//! branch on the failure kind (or just the status code) without knowing
//! anything about the transport underneath.

use thiserror::Error;

/// The error type for all gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
  /// The upstream answered with a non-2xx status.
  #[error("upstream returned HTTP {status}: {body}")]
  Upstream {
    /// HTTP status code of the upstream response.
    status: u16,
    /// Response body as received, useful for diagnostics.
    body: String,
  },

  /// The request went out but no response came back (connect failure or
  /// timeout).
  #[error("no response from upstream (network failure or timeout)")]
  NoResponse,

  /// The request could not be built or sent, or the response body could not
  /// be decoded.
  #[error("request error: {0}")]
  Request(String),

  /// Base URL or credential missing/invalid. Raised before any network call.
  #[error("configuration error: {0}")]
  Configuration(String),

  /// An aggregation matched zero issues after filtering. Not a transport
  /// failure; surfaced distinctly so callers can present an empty report.
  #[error("no issues matched: {0}")]
  EmptyResult(String),
}

impl GatewayError {
  /// The upstream status code, when one was received.
  pub fn status_code(&self) -> Option<u16> {
    match self {
      GatewayError::Upstream { status, .. } => Some(*status),
      _ => None,
    }
  }

  /// True for an upstream 404. The user discovery probe treats this as a
  /// miss; every other error aborts enumeration.
  pub fn is_not_found(&self) -> bool {
    self.status_code() == Some(404)
  }
}

/// A specialized Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
