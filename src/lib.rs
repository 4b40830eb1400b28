//! clusage - Interactive terminal dashboard for Claude usage history
//!
//! This library provides:
//! - Aggregation of hourly usage records into hour, day, week and month figures
//! - Calendar arithmetic for the periods the views compare
//! - The Calendar, Detail, Compare and Histogram views
//! - The viewer entry point and a non-interactive summary report
//!
//! The terminal shell lives in `clusage-terminal`, the on-disk reader in
//! `clusage-history` and the cost rules in `clusage-pricing`.
//!
//! # Examples
//!
//! ```no_run
//! use clusage::viewer::{ViewerOptions, run_history_viewer};
//!
//! #[tokio::main]
//! async fn main() -> clusage_core::Result<()> {
//!     run_history_viewer(ViewerOptions::default()).await
//! }
//! ```

pub mod aggregation;
pub mod cli;
pub mod format;
pub mod periods;
pub mod summary;
pub mod viewer;
pub mod views;

// Re-export commonly used types
pub use clusage_core::{ClusageError, Result};
pub use viewer::{ViewerOptions, run_history_viewer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
