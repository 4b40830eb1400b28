//! Daily file reader
//!
//! Reads one JSON file per day from `<base>/data/daily/`. A missing file
//! means "no data that day" and is skipped silently. A file that fails to
//! parse or does not match the [`DailyUsageFile`] schema is recorded as a
//! per-date error and the remaining dates are still read. Permission errors
//! abort the whole read, since every following date would fail the same way.
//!
//! # Examples
//!
//! ```no_run
//! use clusage_core::HistoryReader;
//! use clusage_history::DailyFileReader;
//! use chrono::NaiveDate;
//!
//! # async fn example() -> clusage_core::Result<()> {
//! let reader = DailyFileReader::from_default()?;
//! let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
//!
//! let result = reader.read_history(start, end).await?;
//! println!("{} days, {} errors", result.data.len(), result.errors.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use clusage_core::error::{ClusageError, Result};
use clusage_core::history::{HistoryReadResult, HistoryReader, ReadError};
use clusage_core::paths;
use clusage_core::types::DailyUsageFile;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// What reading one day produced
enum DayOutcome {
    Missing,
    Loaded(DailyUsageFile),
    Failed(ReadError),
}

/// Reader for the on-disk daily usage files
#[derive(Debug, Clone)]
pub struct DailyFileReader {
    base: PathBuf,
}

impl DailyFileReader {
    /// Read from the data directory rooted at `base`
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Read from `~/.claudeusage` or `CLUSAGE_HOME`
    pub fn from_default() -> Result<Self> {
        let base = paths::base_data_dir()?;
        debug!("Reading daily files from {}", paths::daily_dir(&base).display());
        Ok(Self::new(base))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Read and parse a single day
    async fn read_day(&self, date: NaiveDate) -> Result<DayOutcome> {
        let path = paths::daily_file_path(&self.base, date);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!("No daily file for {}", date);
                return Ok(DayOutcome::Missing);
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(ClusageError::Io(e));
            }
            Err(e) => {
                return Ok(DayOutcome::Failed(ReadError {
                    date,
                    reason: e.to_string(),
                }));
            }
        };

        match serde_json::from_str::<DailyUsageFile>(&content) {
            Ok(file) => Ok(DayOutcome::Loaded(file)),
            Err(e) => {
                warn!("Failed to parse daily file {}: {}", path.display(), e);
                Ok(DayOutcome::Failed(ReadError {
                    date,
                    reason: e.to_string(),
                }))
            }
        }
    }
}

#[async_trait]
impl HistoryReader for DailyFileReader {
    async fn read_history(&self, start: NaiveDate, end: NaiveDate) -> Result<HistoryReadResult> {
        let mut result = HistoryReadResult::default();
        if start > end {
            return Ok(result);
        }

        for date in start.iter_days().take_while(|d| *d <= end) {
            match self.read_day(date).await? {
                DayOutcome::Loaded(file) => result.data.push(file),
                DayOutcome::Missing => {}
                DayOutcome::Failed(error) => result.errors.push(error),
            }
        }

        debug!(
            "Read {} daily files ({} errors) for {}..={}",
            result.data.len(),
            result.errors.len(),
            start,
            end
        );
        Ok(result)
    }
}
