//! Error types for sqlerd.
//!
//! The diagram engine itself never fails: a query it cannot make sense of
//! simply yields a smaller (or empty) graph. These errors only come from the
//! edges of the program, reading input and loading configuration.

use thiserror::Error;

/// The main error type for sqlerd operations.
#[derive(Debug, Error)]
pub enum SqlerdError {
    /// Input exceeded the configured size cap.
    #[error("Input too large: {size} bytes (limit is {limit} bytes)")]
    InputTooLarge { size: usize, limit: usize },

    /// Configuration file could not be parsed.
    #[error("Configuration error in {path}: {message}")]
    Config { path: String, message: String },

    /// Failed to serialize a graph.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SqlerdError {
    /// Create a configuration error for the given file.
    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for sqlerd operations.
pub type SqlerdResult<T> = Result<T, SqlerdError>;
