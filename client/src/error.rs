//! Unified error handling for the client.

use std::time::Duration;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Engine error: {0}")]
    Engine(#[from] quotebook_engine::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Remote fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_convert() {
        let err: AppError = quotebook_engine::Error::InvalidInput("empty".into()).into();
        assert_eq!(err.to_string(), "Engine error: invalid input: empty");
    }

    #[test]
    fn timeout_display() {
        let err = AppError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "Remote fetch timed out after 10s");
    }
}
