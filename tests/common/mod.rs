//! Common test utilities and helpers for clusage tests
//!
//! Builders for usage records, a temporary data directory that writes
//! daily files in the on-disk layout, and the environment guard shared by
//! tests that touch process variables.

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use clusage_core::{DailyUsageFile, TokenBreakdown, UsageRecord, paths};
use once_cell::sync::Lazy;
use std::env;
use std::path::Path;
use tempfile::TempDir;

// Global mutex to serialize environment variable modifications in tests
pub static ENV_MUTEX: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

/// Common models used across tests
pub const TEST_MODELS: &[&str] = &["Opus 4.5", "Sonnet 4.5", "Haiku 4.5"];

/// Builder for creating test UsageRecord instances
pub struct UsageRecordBuilder {
    timestamp: DateTime<FixedOffset>,
    session: f64,
    weekly: f64,
    model: Option<String>,
    tokens: Option<TokenBreakdown>,
    cost_usd: Option<f64>,
}

impl UsageRecordBuilder {
    /// A record at 2026-10-18 09:00 UTC with 10% session and 20% weekly use
    pub fn new() -> Self {
        Self {
            timestamp: utc(2026, 10, 18, 9),
            session: 0.1,
            weekly: 0.2,
            model: None,
            tokens: None,
            cost_usd: None,
        }
    }

    pub fn at(mut self, y: i32, m: u32, d: u32, h: u32) -> Self {
        self.timestamp = utc(y, m, d, h);
        self
    }

    pub fn with_timestamp(mut self, ts: DateTime<FixedOffset>) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn with_session(mut self, utilization: f64) -> Self {
        self.session = utilization;
        self
    }

    pub fn with_weekly(mut self, utilization: f64) -> Self {
        self.weekly = utilization;
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens = Some(TokenBreakdown::new(input, output, 0, 0));
        self
    }

    pub fn with_cost(mut self, usd: f64) -> Self {
        self.cost_usd = Some(usd);
        self
    }

    pub fn build(self) -> UsageRecord {
        let mut record = UsageRecord::new(self.timestamp, self.session, self.weekly);
        record.model = self.model;
        record.tokens = self.tokens;
        record.cost_usd = self.cost_usd;
        record
    }
}

impl Default for UsageRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(y, m, d, h, 0, 0)
        .unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Hourly records for one day with a rising session utilization
pub fn day_of_records(y: i32, m: u32, d: u32, hours: impl IntoIterator<Item = u32>) -> Vec<UsageRecord> {
    hours
        .into_iter()
        .map(|h| {
            UsageRecordBuilder::new()
                .at(y, m, d, h)
                .with_session(f64::from(h) / 24.0)
                .with_weekly(0.3)
                .with_tokens(1_000, 500)
                .build()
        })
        .collect()
}

/// A temporary clusage data directory
pub struct TestDataDir {
    pub dir: TempDir,
}

impl TestDataDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `records` as the daily file for `date`
    pub fn write_day(&self, date: NaiveDate, records: Vec<UsageRecord>) {
        let file = DailyUsageFile { date, records };
        self.write_raw(date, &serde_json::to_string_pretty(&file).unwrap());
    }

    /// Write arbitrary content as the daily file for `date`
    pub fn write_raw(&self, date: NaiveDate, content: &str) {
        let path = paths::daily_file_path(self.path(), date);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    pub fn write_settings(&self, json: &str) {
        let path = paths::settings_path(self.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }
}

/// RAII guard for environment variable manipulation in tests
pub struct EnvVarGuard {
    vars: Vec<(String, Option<String>)>,
}

impl EnvVarGuard {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.push((key.to_string(), env::var(key).ok()));
        // env::set_var is unsafe since edition 2024
        unsafe {
            env::set_var(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.vars.push((key.to_string(), env::var(key).ok()));
        unsafe {
            env::remove_var(key);
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.vars.iter().rev() {
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
