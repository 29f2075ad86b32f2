use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GatewayError, Result};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default cache time-to-live in seconds (5 minutes).
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub mantis: MantisConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MantisConfig {
  /// Base URL of the Mantis REST API, e.g. "https://bugs.example.com/api/rest"
  pub url: String,
  /// Connect/response timeout applied to every upstream call
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Whether responses are cached at all
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// How long a cached response stays valid
  #[serde(default = "default_cache_ttl_secs")]
  pub ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      ttl_secs: DEFAULT_CACHE_TTL_SECS,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Directory for rolling log files. Logs go to stderr only when unset.
  pub dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
  DEFAULT_TIMEOUT_SECS
}

fn default_cache_ttl_secs() -> u64 {
  DEFAULT_CACHE_TTL_SECS
}

fn default_true() -> bool {
  true
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./mantis-gateway.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/mantis-gateway/config.yaml
  /// 4. ~/.config/mantis-gateway/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(GatewayError::Configuration(format!(
          "config file not found: {}",
          p.display()
        )));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(GatewayError::Configuration(
        "no configuration file found; create one at ~/.config/mantis-gateway/config.yaml"
          .to_string(),
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("mantis-gateway.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("mantis-gateway").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
      GatewayError::Configuration(format!("failed to read config file {}: {}", path.display(), e))
    })?;

    let config: Config = serde_yaml::from_str(&contents).map_err(|e| {
      GatewayError::Configuration(format!(
        "failed to parse config file {}: {}",
        path.display(),
        e
      ))
    })?;

    config.validate()?;
    Ok(config)
  }

  /// Check that the base URL is usable. Runs once at startup, before any
  /// network call is attempted.
  pub fn validate(&self) -> Result<()> {
    let parsed = url::Url::parse(&self.mantis.url)
      .map_err(|e| GatewayError::Configuration(format!("invalid Mantis URL: {}", e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
      return Err(GatewayError::Configuration(format!(
        "unsupported URL scheme '{}'",
        parsed.scheme()
      )));
    }

    Ok(())
  }

  /// Request timeout as a [`Duration`].
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.mantis.timeout_secs)
  }

  /// Get the Mantis API token from environment variables.
  ///
  /// Checks MANTIS_GW_TOKEN first, then MANTIS_API_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("MANTIS_GW_TOKEN")
      .or_else(|_| std::env::var("MANTIS_API_TOKEN"))
      .map_err(|_| {
        GatewayError::Configuration(
          "Mantis API token not found; set MANTIS_GW_TOKEN or MANTIS_API_TOKEN".to_string(),
        )
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(yaml: &str) -> Config {
    serde_yaml::from_str(yaml).expect("config should parse")
  }

  #[test]
  fn minimal_config_gets_defaults() {
    let config = parse("mantis:\n  url: https://bugs.example.com/api/rest\n");

    assert_eq!(config.mantis.timeout_secs, 10);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.ttl_secs, 300);
    assert!(config.logging.dir.is_none());
    assert!(config.validate().is_ok());
  }

  #[test]
  fn cache_can_be_disabled() {
    let config = parse(
      "mantis:\n  url: https://bugs.example.com/api/rest\ncache:\n  enabled: false\n  ttl_secs: 60\n",
    );

    assert!(!config.cache.enabled);
    assert_eq!(config.cache.ttl_secs, 60);
  }

  #[test]
  fn invalid_url_is_a_configuration_error() {
    let config = parse("mantis:\n  url: not a url\n");

    match config.validate() {
      Err(GatewayError::Configuration(_)) => {}
      other => panic!("expected configuration error, got {:?}", other),
    }
  }

  #[test]
  fn non_http_scheme_is_rejected() {
    let config = parse("mantis:\n  url: ftp://bugs.example.com\n");
    assert!(config.validate().is_err());
  }
}
