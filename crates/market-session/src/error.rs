//! Error types for market-session operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The text is not a valid timeframe notation.
    #[error("Invalid timeframe: {0}")]
    InvalidFormat(String),

    /// A minute count is outside the accepted range.
    #[error("Out of range: {0}")]
    Range(String),

    /// Validated input reached a dispatch arm that should not exist.
    #[error("Unreachable: {0}")]
    Unreachable(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
