//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cellsim operations
#[derive(Error, Debug)]
pub enum CellsimError {
    /// I/O errors (file missing, permission denied, read/write failures)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Pileup parsing errors (malformed records, missing fields)
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Invalid data errors (non-monotone positions, mismatched field lengths)
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Configuration errors (rates outside [0, 1], invalid CLI arguments)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File not found errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },
}

/// Type alias for Results using CellsimError
pub type Result<T> = std::result::Result<T, CellsimError>;

impl CellsimError {
    /// Create a parse error with a message
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
