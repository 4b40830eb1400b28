//! Core types, traits, and utilities for clusage
//!
//! This crate provides the foundational types, error handling, timezone
//! configuration, settings, translations, and the history reader seam used
//! by all other clusage crates.

pub mod error;
pub mod history;
pub mod i18n;
pub mod paths;
pub mod settings;
pub mod timezone;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{ClusageError, Result};
pub use history::{HistoryReadResult, HistoryReader, MemoryHistoryReader, ReadError};
pub use i18n::{I18n, Locale};
pub use settings::Settings;
pub use timezone::{Clock, TimezoneConfig};
pub use types::{DailyUsageFile, TokenBreakdown, UsageRecord, UtilizationWindow};
