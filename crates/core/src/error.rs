//! Error types for the reactive model
//!
//! Navigation never fails: an absent path is an empty result. The errors
//! here cover strict updates, transactions and malformed input. We use
//! `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::path::{LimitError, Path, PathParseError};
use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Error types for the reactive model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// Path string could not be parsed
    #[error("invalid path: {0}")]
    PathParse(#[from] PathParseError),

    /// Path exceeds a configured limit
    #[error("path limit: {0}")]
    Limit(#[from] LimitError),

    /// A strict write met a primitive where it needed to descend into a map
    #[error("invalid path transition at {path}: expected map, found primitive")]
    InvalidPathTransition {
        /// Prefix of the write path that holds the primitive
        path: Path,
    },

    /// Transaction body failed; the root was left unchanged
    #[error("transaction aborted: {reason}")]
    TransactionAborted {
        /// Human-readable reason supplied by the body
        reason: String,
    },

    /// A transaction was started while this thread already holds the writer slot
    #[error("re-entrant transaction: a transaction is already running on this thread")]
    ReentrantTransaction,

    /// Invalid input or configuration
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ModelError {
    /// Abort the surrounding transaction with a reason
    pub fn aborted(reason: impl Into<String>) -> Self {
        ModelError::TransactionAborted {
            reason: reason.into(),
        }
    }

    /// Invalid input
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ModelError::InvalidInput(msg.into())
    }

    /// Check if this error aborted a transaction body
    pub fn is_aborted(&self) -> bool {
        matches!(self, ModelError::TransactionAborted { .. })
    }
}
