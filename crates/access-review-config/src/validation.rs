//! Configuration validation
//!
//! Validates configuration values and ensures consistency

use thiserror::Error;

use crate::{CacheConfig, CheckerConfig, Config};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid log level: {0} (must be one of: trace, debug, info, warn, error)")]
    InvalidLogLevel(String),

    #[error("Invalid cache capacity: {0} (must be > 0 when set)")]
    InvalidCacheCapacity(u64),

    #[error("Invalid cache TTL: {0} (must be > 0 when set)")]
    InvalidCacheTTL(u64),

    #[error("Invalid checker URL '{0}': must start with http:// or https://")]
    InvalidBaseUrl(String),

    #[error("Invalid checker timeout: {0}ms (must be > 0)")]
    InvalidTimeout(u64),

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type alias for validation operations
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Validate complete configuration
pub fn validate(config: &Config) -> Result<()> {
    let mut errors = Vec::new();

    if let Err(e) = validate_logging(&config.logging) {
        errors.push(e);
    }

    if let Err(e) = validate_cache(&config.cache) {
        errors.push(e);
    }

    if let Err(e) = validate_checker(&config.checker) {
        errors.push(e);
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Validate logging level
pub fn validate_logging(level: &str) -> Result<()> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::InvalidLogLevel(level.to_string())),
    }
}

/// Validate cache configuration
pub fn validate_cache(config: &CacheConfig) -> Result<()> {
    if let Some(0) = config.max_capacity {
        return Err(ValidationError::InvalidCacheCapacity(0));
    }

    if let Some(0) = config.ttl {
        return Err(ValidationError::InvalidCacheTTL(0));
    }

    Ok(())
}

/// Validate checker configuration
pub fn validate_checker(config: &CheckerConfig) -> Result<()> {
    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
        return Err(ValidationError::InvalidBaseUrl(config.base_url.clone()));
    }

    if config.timeout_ms == 0 {
        return Err(ValidationError::InvalidTimeout(config.timeout_ms));
    }

    Ok(())
}
