//! Error types for the runtime layer
//!
//! Wraps the lower-level model and lifetime errors and adds the failures
//! that only make sense once entities and configuration exist.

use reactive_core::ModelError;
use reactive_lifetime::LifetimeError;
use thiserror::Error;

/// Result type alias for runtime operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Error types for the runtime layer
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Tree or transaction failure
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Operation on a terminated scope
    #[error(transparent)]
    Lifetime(#[from] LifetimeError),

    /// No entity registered under this key
    #[error("Unknown entity: {key}")]
    UnknownEntity {
        /// Debug rendering of the key
        key: String,
    },

    /// An entity is already registered under this key
    #[error("Duplicate entity: {key}")]
    DuplicateEntity {
        /// Debug rendering of the key
        key: String,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Create an UnknownEntity error from any debuggable key
    pub fn unknown_entity(key: &impl std::fmt::Debug) -> Self {
        EngineError::UnknownEntity {
            key: format!("{:?}", key),
        }
    }

    /// Create a DuplicateEntity error from any debuggable key
    pub fn duplicate_entity(key: &impl std::fmt::Debug) -> Self {
        EngineError::DuplicateEntity {
            key: format!("{:?}", key),
        }
    }

    /// Create a Config error
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::Config(msg.into())
    }
}
