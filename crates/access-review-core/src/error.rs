use access_review_config::validation::ValidationError;
use thiserror::Error;

/// Errors raised while resolving a permission check
///
/// A denial is not an error: a check that completes with `allowed=false` is a
/// normal, cached [`Decision::Deny`](access_review_types::Decision::Deny).
/// Every variant is `Clone` so one failure can be handed to every caller that
/// was waiting on the same check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The decision service could not be reached (network failure, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The decision service answered with a non-success status
    #[error("Access review rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// The decision service answered with an undecodable body
    #[error("Invalid access review response: {0}")]
    InvalidResponse(String),

    /// The check task panicked or was cancelled before settling
    #[error("Access check aborted: {0}")]
    Aborted(String),
}

impl CheckError {
    /// Whether retrying the same check later could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            CheckError::Transport(_) | CheckError::Aborted(_) => true,
            CheckError::Rejected { status, .. } => *status >= 500 || *status == 429,
            CheckError::InvalidResponse(_) => false,
        }
    }
}

/// Result type alias for permission check operations
pub type Result<T> = std::result::Result<T, CheckError>;

/// Errors raised while assembling the pipeline from configuration
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Failed to create access checker: {0}")]
    Checker(#[from] CheckError),
}
