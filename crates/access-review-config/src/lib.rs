//! # Access Review Config - Configuration Management
//!
//! Handles configuration loading from files and environment variables.
//!
//! ```yaml
//! logging: "info"
//! cache:
//!   # Both optional. Leaving them unset keeps every decision for the
//!   # lifetime of the process.
//!   max_capacity: 50000
//!   ttl: 600
//! checker:
//!   base_url: "https://kubernetes.default.svc"
//!   timeout_ms: 10000
//! ```
//!
//! Environment variables override the file, e.g. `ACCESS_REVIEW__CACHE__TTL=60`.

pub mod validation;

use std::{path::Path, time::Duration};

use access_review_observe::LogConfig;
use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_logging")]
    pub logging: String,

    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub checker: CheckerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: default_logging(),
            cache: CacheConfig::default(),
            checker: CheckerConfig::default(),
        }
    }
}

impl Config {
    /// Logging setup for the configured level
    pub fn log_config(&self) -> LogConfig {
        LogConfig::with_level(&self.logging)
    }
}

fn default_logging() -> String {
    "info".to_string()
}

/// Permission cache limits
///
/// Unset fields mean "unbounded" and "never expires".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached decisions
    #[serde(default)]
    pub max_capacity: Option<u64>,

    /// Time-to-live of a cached decision in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl CacheConfig {
    pub fn ttl_duration(&self) -> Option<Duration> {
        self.ttl.map(Duration::from_secs)
    }
}

/// Connection settings for the authorization decision service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Base URL of the API server answering SelfSubjectAccessReviews
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token presented on every review
    #[serde(default, skip_serializing)]
    pub bearer_token: Option<String>,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            bearer_token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl CheckerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_base_url() -> String {
    "https://kubernetes.default.svc".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// Load configuration with layered precedence
///
/// 1. serde defaults
/// 2. the file at `path`, if it exists
/// 3. `ACCESS_REVIEW__*` environment variables
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let builder = ConfigBuilder::builder().add_source(File::from(path.as_ref()).required(false));

    let builder = builder
        .add_source(Environment::with_prefix("ACCESS_REVIEW").separator("__").try_parsing(true));

    builder.build()?.try_deserialize()
}

/// Load configuration with defaults
///
/// Convenience wrapper around `load()` that logs warnings but never panics.
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Config {
    match load(path.as_ref()) {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully from {:?}", path.as_ref());
            config
        },
        Err(e) => {
            tracing::warn!(
                "Failed to load config from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Config::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging, "info");
        assert_eq!(config.cache, CacheConfig { max_capacity: None, ttl: None });
        assert_eq!(config.checker.base_url, "https://kubernetes.default.svc");
        assert_eq!(config.checker.timeout(), Duration::from_secs(10));
        assert!(config.checker.bearer_token.is_none());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = load("/nonexistent/access-review.yaml").unwrap();
        assert_eq!(config.logging, "info");
        assert!(config.cache.ttl_duration().is_none());
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
logging: debug
cache:
  ttl: 120
checker:
  base_url: "https://api.cluster.example.com:6443"
  bearer_token: "sha256~token"
  timeout_ms: 2500
"#,
        );

        let config = load(file.path()).unwrap();

        assert_eq!(config.logging, "debug");
        assert_eq!(config.cache.max_capacity, None);
        assert_eq!(config.cache.ttl_duration(), Some(Duration::from_secs(120)));
        assert_eq!(config.checker.base_url, "https://api.cluster.example.com:6443");
        assert_eq!(config.checker.bearer_token.as_deref(), Some("sha256~token"));
        assert_eq!(config.checker.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_log_config_uses_configured_level() {
        let config = Config { logging: "WARN".to_string(), ..Config::default() };
        assert_eq!(config.log_config().filter.as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_or_default_on_malformed_file() {
        let file = write_config("cache: [this is not a map");

        let config = load_or_default(file.path());

        assert_eq!(config.logging, "info");
    }
}
