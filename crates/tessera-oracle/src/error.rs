//! Error types for the price feed board.

use thiserror::Error;

/// Result type alias for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;

/// Errors that can occur when querying or updating feeds.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The feed id has never been registered.
    #[error("unknown feed: {id}")]
    UnknownFeed {
        /// Feed identifier.
        id: u32,
    },

    /// The feed exists but has never published a rate.
    #[error("no data for feed {id}")]
    NoData {
        /// Feed identifier.
        id: u32,
    },

    /// A published rate was rejected.
    #[error("invalid rate: {message}")]
    InvalidRate {
        /// Description of the rejection.
        message: String,
    },
}

impl OracleError {
    /// Create an invalid rate error.
    #[must_use]
    pub fn invalid_rate(message: impl Into<String>) -> Self {
        Self::InvalidRate {
            message: message.into(),
        }
    }
}
