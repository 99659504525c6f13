//! Error types for geocell.

use thiserror::Error;

/// Errors surfaced by parsing, configuration and query operations.
#[derive(Debug, Error)]
pub enum GeocellError {
    /// Malformed geometry bytes or text.
    #[error("parse error: {0}")]
    Parse(String),

    /// Caller broke an input contract (range order, depth, non-finite radius).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Recognized but unimplemented geometry subtype.
    #[error("not supported: {0}")]
    Unsupported(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure reported by an external index or row source.
    #[error("storage error: {0}")]
    Storage(String),
}

impl GeocellError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, GeocellError>;
