//! Logging errors.

/// Errors raised while installing a subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter: {0}")]
    Filter(String),
}

/// Result alias for logging setup.
pub type LogResult<T> = Result<T, LogError>;
