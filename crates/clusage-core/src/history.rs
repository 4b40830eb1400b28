//! History reader trait
//!
//! This module defines the `HistoryReader` trait that storage backends
//! implement. Views consume daily usage files only through this seam, so a
//! test can substitute [`MemoryHistoryReader`] for the on-disk reader.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::error::{ClusageError, Result};
use crate::types::{DailyUsageFile, UsageRecord};

/// A per-date failure that did not abort the range read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError {
    pub date: NaiveDate,
    pub reason: String,
}

/// Outcome of reading a date range
///
/// `data` omits dates without a file; those are not errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryReadResult {
    pub data: Vec<DailyUsageFile>,
    pub errors: Vec<ReadError>,
}

impl HistoryReadResult {
    /// True when every existing file in the range parsed
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turn the first per-date failure into an error, keeping the data otherwise
    pub fn into_checked(self) -> Result<Vec<DailyUsageFile>> {
        match self.errors.into_iter().next() {
            Some(ReadError { date, reason }) => Err(ClusageError::Load { date, reason }),
            None => Ok(self.data),
        }
    }

    /// All records of all loaded days, in day order
    pub fn records(&self) -> Vec<UsageRecord> {
        self.data
            .iter()
            .flat_map(|day| day.records.iter().cloned())
            .collect()
    }
}

/// Trait for daily usage storage backends
#[async_trait]
pub trait HistoryReader: Send + Sync {
    /// Read every daily file in the inclusive range `start..=end`
    ///
    /// A start date after the end date yields an empty result.
    async fn read_history(&self, start: NaiveDate, end: NaiveDate) -> Result<HistoryReadResult>;
}

/// In-memory reader for tests and demos
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryReader {
    days: BTreeMap<NaiveDate, DailyUsageFile>,
    failures: BTreeMap<NaiveDate, String>,
}

impl MemoryHistoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a day of records, replacing any previous entry for that date
    pub fn with_day(mut self, day: DailyUsageFile) -> Self {
        self.days.insert(day.date, day);
        self
    }

    /// Group loose records into days by their own calendar date
    pub fn with_records(mut self, records: impl IntoIterator<Item = UsageRecord>) -> Self {
        for record in records {
            let date = record.timestamp.date_naive();
            self.days
                .entry(date)
                .or_insert_with(|| DailyUsageFile::empty(date))
                .records
                .push(record);
        }
        self
    }

    /// Make `date` report a parse failure
    pub fn with_failure(mut self, date: NaiveDate, reason: impl Into<String>) -> Self {
        self.failures.insert(date, reason.into());
        self
    }
}

#[async_trait]
impl HistoryReader for MemoryHistoryReader {
    async fn read_history(&self, start: NaiveDate, end: NaiveDate) -> Result<HistoryReadResult> {
        if start > end {
            return Ok(HistoryReadResult::default());
        }
        let data = self.days.range(start..=end).map(|(_, d)| d.clone()).collect();
        let errors = self
            .failures
            .range(start..=end)
            .map(|(date, reason)| ReadError {
                date: *date,
                reason: reason.clone(),
            })
            .collect();
        Ok(HistoryReadResult { data, errors })
    }
}
