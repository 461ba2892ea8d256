//! Error types for StashKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StashError
pub type Result<T> = std::result::Result<T, StashError>;

/// Unified error type for StashKV operations
#[derive(Debug, Error)]
pub enum StashError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Strategy Resolution Errors
    // -------------------------------------------------------------------------
    #[error("No storage strategy for value of kind '{kind}'")]
    UnsupportedValue { kind: String },

    #[error("No storage strategy for file extension '{extension}'")]
    UnsupportedFormat { extension: String },

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Value Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Shape mismatch: shape holds {expected} elements, data has {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StashError {
    pub(crate) fn unsupported_value(kind: impl Into<String>) -> Self {
        StashError::UnsupportedValue { kind: kind.into() }
    }

    pub(crate) fn unsupported_format(extension: impl Into<String>) -> Self {
        StashError::UnsupportedFormat {
            extension: extension.into(),
        }
    }
}
