//! Error types for the Quotebook engine.

use thiserror::Error;

/// All possible errors from the Quotebook engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Input errors
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed import: {0}")]
    MalformedImport(String),

    // Persistence errors
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
