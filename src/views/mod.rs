//! Interactive screens of the history viewer
//!
//! Each view is a [`Component`](clusage_terminal::Component) that reads
//! history through [`ViewerServices`] and never blocks the event loop:
//! storage reads run as [`BackgroundLoad`]s and are collected in
//! `poll_updates`.

pub mod calendar;
pub mod compare;
pub mod detail;
pub mod histogram;

pub use calendar::CalendarView;
pub use compare::{CompareMode, CompareView};
pub use detail::DetailView;
pub use histogram::{CompareSubMode, HistogramMode, HistogramView};

use chrono::NaiveDate;
use clusage_core::{Clock, HistoryReadResult, HistoryReader, I18n, Result, Settings};
use clusage_terminal::{BackgroundLoad, LoadWaker, theme};
use std::sync::Arc;

/// Collaborators shared by every view
#[derive(Clone)]
pub struct ViewerServices {
    pub reader: Arc<dyn HistoryReader>,
    pub i18n: I18n,
    pub settings: Arc<Settings>,
    pub clock: Clock,
    pub waker: LoadWaker,
}

impl ViewerServices {
    pub fn new(
        reader: Arc<dyn HistoryReader>,
        i18n: I18n,
        settings: Settings,
        clock: Clock,
        waker: LoadWaker,
    ) -> Self {
        Self {
            reader,
            i18n,
            settings: Arc::new(settings),
            clock,
            waker,
        }
    }

    /// Start reading `start..=end` in the background
    pub fn spawn_read(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BackgroundLoad<Result<HistoryReadResult>> {
        let reader = Arc::clone(&self.reader);
        BackgroundLoad::spawn(
            async move { reader.read_history(start, end).await },
            self.waker.clone(),
        )
    }

    /// Run an arbitrary read job in the background
    pub fn spawn<T, F>(&self, job: F) -> BackgroundLoad<T>
    where
        T: Send + 'static,
        F: std::future::Future<Output = T> + Send + 'static,
    {
        BackgroundLoad::spawn(job, self.waker.clone())
    }
}

/// Shown dates listed in a skipped-files notice before it is cut short
const SKIPPED_DATES_SHOWN: usize = 3;

/// Dates whose files could not be read during a view's last load
///
/// The readable days of a range are still shown; this keeps the failed
/// ones so the view can say the figures are partial instead of passing a
/// corrupt day off as an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkippedDays(Vec<NaiveDate>);

impl SkippedDays {
    /// Log and remember the per-date failures of a range read
    pub fn record(&mut self, view: &str, result: &HistoryReadResult) {
        for error in &result.errors {
            tracing::warn!("{} view skipped {}: {}", view, error.date, error.reason);
            if !self.0.contains(&error.date) {
                self.0.push(error.date);
            }
        }
        self.0.sort_unstable();
    }

    pub fn from_result(view: &str, result: &HistoryReadResult) -> Self {
        let mut skipped = Self::default();
        skipped.record(view, result);
        skipped
    }

    pub fn extend(&mut self, other: SkippedDays) {
        for date in other.0 {
            if !self.0.contains(&date) {
                self.0.push(date);
            }
        }
        self.0.sort_unstable();
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Inline warning for the view, `None` when every file was read
    pub fn notice(&self, i18n: &I18n) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let mut dates = self
            .0
            .iter()
            .take(SKIPPED_DATES_SHOWN)
            .map(NaiveDate::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        if self.0.len() > SKIPPED_DATES_SHOWN {
            dates.push_str(", …");
        }
        let message = i18n.t_with(
            "common.skippedFiles",
            &[("count", &self.0.len()), ("dates", &dates)],
        );
        Some(theme::warning(&format!("⚠ {message}")).to_string())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone, Utc};
    use chrono_tz::Tz;
    use clusage_core::{ClusageError, Locale, MemoryHistoryReader, UsageRecord};
    use clusage_terminal::{AppContext, Component, Size};
    use std::time::Duration;

    /// 2026-10-18 15:30 UTC, a Sunday
    pub fn clock() -> Clock {
        Clock::fixed(
            Tz::UTC,
            Utc.with_ymd_and_hms(2026, 10, 18, 15, 30, 0).unwrap(),
        )
    }

    pub fn record(y: i32, m: u32, d: u32, h: u32, session: f64, weekly: f64) -> UsageRecord {
        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap();
        UsageRecord::new(ts, session, weekly)
    }

    /// A reader whose every range read fails
    pub struct BrokenReader;

    #[async_trait]
    impl HistoryReader for BrokenReader {
        async fn read_history(&self, _: NaiveDate, _: NaiveDate) -> Result<HistoryReadResult> {
            Err(ClusageError::Config("disk unavailable".to_string()))
        }
    }

    /// A reader whose read task dies before producing a result
    pub struct PanickingReader;

    #[async_trait]
    impl HistoryReader for PanickingReader {
        async fn read_history(&self, _: NaiveDate, _: NaiveDate) -> Result<HistoryReadResult> {
            panic!("reader task died");
        }
    }

    pub fn panicking_services() -> ViewerServices {
        let mut services = services(MemoryHistoryReader::new());
        services.reader = Arc::new(PanickingReader);
        services
    }

    pub fn broken_services() -> ViewerServices {
        let mut services = services(MemoryHistoryReader::new());
        services.reader = Arc::new(BrokenReader);
        services
    }

    pub fn services(reader: MemoryHistoryReader) -> ViewerServices {
        ViewerServices::new(
            Arc::new(reader),
            I18n::new(Locale::En),
            Settings::default(),
            clock(),
            LoadWaker::new(),
        )
    }

    pub fn ctx() -> AppContext {
        AppContext::new(Size::new(80, 30))
    }

    pub fn plain(lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .map(|l| clusage_terminal::text::strip_styles(l).into_owned())
            .collect()
    }

    /// Poll until the component reports a change, waiting on the waker
    pub async fn settle(component: &mut dyn Component, waker: &LoadWaker) {
        for _ in 0..50 {
            if component.poll_updates() {
                return;
            }
            let _ = tokio::time::timeout(Duration::from_millis(100), waker.notified()).await;
        }
        panic!("background load never completed");
    }
}
