//! Core domain types for clusage
//!
//! These types mirror the shape of the daily snapshot files written by the
//! usage recorder. They are consumed read-only: nothing in the viewer ever
//! mutates a [`UsageRecord`] after it has been loaded.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// One quota window (five-hour session or seven-day weekly)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilizationWindow {
    /// Fraction of the quota consumed, nominally 0.0 to 1.0
    pub utilization: f64,
    /// When the window resets, if the API reported it
    #[serde(default)]
    pub resets_at: Option<DateTime<FixedOffset>>,
}

impl UtilizationWindow {
    /// Create a window without a reset instant
    pub fn new(utilization: f64) -> Self {
        Self {
            utilization,
            resets_at: None,
        }
    }
}

/// Token usage attached to a snapshot
///
/// # Examples
/// ```
/// use clusage_core::types::TokenBreakdown;
///
/// let tokens = TokenBreakdown::new(100, 50, 10, 5);
/// assert_eq!(tokens.total_io(), 150);
/// assert_eq!(tokens.cache_total(), 15);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBreakdown {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub output: u64,
    #[serde(default)]
    pub cache_creation: u64,
    #[serde(default)]
    pub cache_read: u64,
}

impl TokenBreakdown {
    pub fn new(input: u64, output: u64, cache_creation: u64, cache_read: u64) -> Self {
        Self {
            input,
            output,
            cache_creation,
            cache_read,
        }
    }

    /// Input plus output tokens, the figure shown as "total tokens"
    pub fn total_io(&self) -> u64 {
        self.input + self.output
    }

    /// Tokens billed at the cached rate
    pub fn cache_total(&self) -> u64 {
        self.cache_creation + self.cache_read
    }
}

impl Add for TokenBreakdown {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            input: self.input + other.input,
            output: self.output + other.output,
            cache_creation: self.cache_creation + other.cache_creation,
            cache_read: self.cache_read + other.cache_read,
        }
    }
}

impl AddAssign for TokenBreakdown {
    fn add_assign(&mut self, other: Self) {
        self.input += other.input;
        self.output += other.output;
        self.cache_creation += other.cache_creation;
        self.cache_read += other.cache_read;
    }
}

/// Lines changed in the session at snapshot time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChanges {
    #[serde(default)]
    pub added: u64,
    #[serde(default)]
    pub removed: u64,
}

/// A single usage snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// When the snapshot was taken
    pub timestamp: DateTime<FixedOffset>,
    /// Five-hour session window
    pub session: UtilizationWindow,
    /// Seven-day window
    pub weekly: UtilizationWindow,
    /// Model display name reported by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Client-reported session cost in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<LineChanges>,
}

impl UsageRecord {
    /// Create a record with only the two utilization figures set
    pub fn new(timestamp: DateTime<FixedOffset>, session: f64, weekly: f64) -> Self {
        Self {
            timestamp,
            session: UtilizationWindow::new(session),
            weekly: UtilizationWindow::new(weekly),
            model: None,
            cost_usd: None,
            tokens: None,
            lines: None,
        }
    }
}

/// One calendar day of snapshots, the unit of on-disk storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsageFile {
    /// The day this file covers
    pub date: NaiveDate,
    /// Snapshots in recording order
    pub records: Vec<UsageRecord>,
}

impl DailyUsageFile {
    /// An empty placeholder for a day without data
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            records: Vec::new(),
        }
    }
}
