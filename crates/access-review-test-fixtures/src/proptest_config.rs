//! Shared proptest configuration
//!
//! The `PROPTEST_CASES` environment variable overrides the default case count:
//!
//! ```bash
//! PROPTEST_CASES=500 cargo test
//! ```

use proptest::test_runner::Config as ProptestConfig;

/// Case count when `PROPTEST_CASES` is unset or invalid
pub const DEFAULT_PROPTEST_CASES: u32 = 64;

#[must_use]
pub fn test_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PROPTEST_CASES)
}

#[must_use]
pub fn proptest_config() -> ProptestConfig {
    ProptestConfig::with_cases(test_cases())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proptest_config_creation() {
        assert!(proptest_config().cases > 0);
    }
}
