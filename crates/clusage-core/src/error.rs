//! Error types for clusage
//!
//! This module defines the error types used throughout the clusage crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use clusage_core::error::{ClusageError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to ClusageError
//!     let _file = std::fs::read_to_string("nonexistent.txt")?;
//!     Ok(())
//! }
//! ```

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for clusage operations
#[derive(Error, Debug)]
pub enum ClusageError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raw mode was requested while stdin is not a terminal
    #[error("stdin is not a TTY - raw mode not available")]
    TerminalNotInteractive,

    /// Month outside 1-12
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid timezone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A daily file could not be parsed or failed schema validation
    #[error("Failed to load {date}: {reason}")]
    Load {
        /// The day whose file failed
        date: NaiveDate,
        /// Parser or validation message
        reason: String,
    },
}

/// Convenience type alias for Results in clusage
///
/// # Example
///
/// ```
/// use clusage_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, ClusageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ClusageError::InvalidMonth(13);
        assert_eq!(error.to_string(), "month must be between 1 and 12, got 13");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let clusage_error: ClusageError = io_error.into();
        assert!(matches!(clusage_error, ClusageError::Io(_)));
    }

    #[test]
    fn test_load_error_display() {
        let error = ClusageError::Load {
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            reason: "Invalid schema".to_string(),
        };
        assert_eq!(error.to_string(), "Failed to load 2026-03-01: Invalid schema");
    }
}
