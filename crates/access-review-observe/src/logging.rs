//! Structured logging utilities
//!
//! Provides logging initialization with contextual fields and formatting options.

use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Default filter when neither the config nor `RUST_LOG` provides one
const DEFAULT_FILTER: &str = "info,access_review=debug";

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (for development)
    Pretty,
    /// Compact format without colors
    Compact,
    /// JSON format (for production)
    Json,
}

#[allow(clippy::derivable_impls)]
impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        {
            LogFormat::Pretty
        }
        #[cfg(not(debug_assertions))]
        {
            LogFormat::Json
        }
    }
}

/// Configuration for logging behavior
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format
    pub format: LogFormat,
    /// Whether to include file/line numbers
    pub include_location: bool,
    /// Whether to include target module
    pub include_target: bool,
    /// Whether to include thread IDs
    pub include_thread_id: bool,
    /// Whether to log span events (enter/exit/close)
    pub log_spans: bool,
    /// Environment filter (e.g., "info,access_review_core=debug")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            include_location: cfg!(debug_assertions),
            include_target: true,
            include_thread_id: false,
            log_spans: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Default configuration filtered at the given level (e.g. the `logging`
    /// value of the service configuration)
    pub fn with_level(level: &str) -> Self {
        Self { filter: Some(level.to_lowercase()), ..Default::default() }
    }
}

/// Build the filter for a configuration, falling back to `RUST_LOG` and then
/// the crate default
fn env_filter(filter: Option<&str>) -> anyhow::Result<EnvFilter> {
    match filter {
        Some(filter) => Ok(EnvFilter::try_new(filter)?),
        None => {
            Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        },
    }
}

/// Initialize structured logging with configuration
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_logging(config: LogConfig) -> anyhow::Result<()> {
    let env_filter = env_filter(config.filter.as_deref())?;

    let fmt_span = if config.log_spans { FmtSpan::NEW | FmtSpan::CLOSE } else { FmtSpan::NONE };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target)
        .with_thread_ids(config.include_thread_id)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_span_events(fmt_span);

    match config.format {
        LogFormat::Pretty => {
            subscriber
                .pretty()
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize pretty logger: {}", e))?;
        },
        LogFormat::Compact => {
            subscriber
                .compact()
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize compact logger: {}", e))?;
        },
        LogFormat::Json => {
            subscriber
                .json()
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize JSON logger: {}", e))?;
        },
    }

    tracing::info!(
        format = ?config.format,
        location = config.include_location,
        target = config.include_target,
        "Logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::default());
        assert!(config.include_target);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_log_format_default() {
        let format = LogFormat::default();
        #[cfg(debug_assertions)]
        assert_eq!(format, LogFormat::Pretty);
        #[cfg(not(debug_assertions))]
        assert_eq!(format, LogFormat::Json);
    }

    #[test]
    fn test_with_level() {
        let config = LogConfig::with_level("DEBUG");
        assert_eq!(config.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_env_filter_accepts_directives() {
        assert!(env_filter(Some("info,access_review_core=trace")).is_ok());
        assert!(env_filter(None).is_ok());
    }

    #[test]
    fn test_init_logging_rejects_bad_filter() {
        let config =
            LogConfig { filter: Some("info,access_review=loud".to_string()), ..Default::default() };
        assert!(init_logging(config).is_err());
    }
}
