//! This period against the previous one
//!
//! Week mode compares the current Monday-to-Sunday week with the one
//! before. Month mode compares the 1st through today with the same days of
//! the previous month, cut short at that month's last day so a long month
//! is never compared against days that do not exist.

use chrono::NaiveDate;
use clap::ValueEnum;
use clusage_core::{ClusageError, Result};
use clusage_terminal::input::format_key_help;
use clusage_terminal::text::Align;
use clusage_terminal::{
    AppContext, BackgroundLoad, Component, ComponentBase, KeyEvent, KeyName, LoadPoll, theme,
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{SkippedDays, ViewerServices};
use crate::aggregation::{PeriodComparison, PeriodStats, TrendResult};
use crate::format::{
    bar_line, column, format_cost, format_tokens, format_trend, header_line, percent_label,
    separator,
};
use crate::periods::{DateRange, month_to_date_ranges, week_range};

const HEADER_WIDTH: usize = 56;
const SEPARATOR_WIDTH: usize = 52;
const PROGRESS_BAR_WIDTH: usize = 25;
const LABEL_WIDTH: usize = 12;
const VALUE_WIDTH: usize = 12;

/// Which pair of periods is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompareMode {
    Week,
    Month,
}

impl CompareMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Week => Self::Month,
            Self::Month => Self::Week,
        }
    }

    /// `(current, previous)` ranges relative to `today`
    pub fn ranges(self, today: NaiveDate) -> Result<(DateRange, DateRange)> {
        match self {
            Self::Week => Ok((week_range(today, 0), week_range(today, -1))),
            Self::Month => month_to_date_ranges(today),
        }
    }

    /// i18n keys of the `(current, previous)` period names
    pub fn label_keys(self) -> (&'static str, &'static str) {
        match self {
            Self::Week => ("compare.thisWeek", "compare.lastWeek"),
            Self::Month => ("compare.thisMonth", "compare.lastMonth"),
        }
    }
}

pub struct CompareView {
    base: ComponentBase,
    services: ViewerServices,
    mode: CompareMode,
    result: Option<PeriodComparison>,
    error: Option<String>,
    skipped: SkippedDays,
    pending: Option<BackgroundLoad<Result<(PeriodComparison, SkippedDays)>>>,
}

impl CompareView {
    /// A week comparison; the read starts when the view is pushed
    pub fn new(services: ViewerServices) -> Self {
        Self {
            base: ComponentBase::new(),
            services,
            mode: CompareMode::Week,
            result: None,
            error: None,
            skipped: SkippedDays::default(),
            pending: None,
        }
    }

    pub fn mode(&self) -> CompareMode {
        self.mode
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn result(&self) -> Option<&PeriodComparison> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Days of either period whose files could not be read
    pub fn skipped_days(&self) -> &[NaiveDate] {
        self.skipped.dates()
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.load();
    }

    /// Read both periods in the background
    ///
    /// Starting a new load drops any running one, so only the latest mode's
    /// figures ever land.
    pub fn load(&mut self) {
        self.error = None;
        self.base.mark_dirty();

        let (current, previous) = match self.mode.ranges(self.services.clock.today()) {
            Ok(ranges) => ranges,
            Err(e) => {
                self.pending = None;
                self.error = Some(e.to_string());
                return;
            }
        };
        debug!("Comparing {} with {}", current, previous);

        let reader = Arc::clone(&self.services.reader);
        self.pending = Some(self.services.spawn(async move {
            let (now, before) = futures::try_join!(
                reader.read_history(current.start, current.end),
                reader.read_history(previous.start, previous.end),
            )?;
            let mut skipped = SkippedDays::from_result("Compare", &now);
            skipped.record("Compare", &before);
            let comparison = PeriodComparison::new(
                PeriodStats::from_days(current.start, current.end, &now.data),
                PeriodStats::from_days(previous.start, previous.end, &before.data),
            );
            Ok::<_, ClusageError>((comparison, skipped))
        }));
    }

    fn labels(&self) -> (String, String) {
        let (current, previous) = self.mode.label_keys();
        let i18n = &self.services.i18n;
        (i18n.t(current), i18n.t(previous))
    }

    fn table_row(label: &str, previous: &str, current: &str, trend: &str) -> String {
        format!(
            "  {}{}{}   {trend}",
            column(label, LABEL_WIDTH, Align::Left),
            column(previous, VALUE_WIDTH, Align::Right),
            column(current, VALUE_WIDTH, Align::Right),
        )
    }

    fn render_result(&self, comparison: &PeriodComparison, lines: &mut Vec<String>) {
        let i18n = &self.services.i18n;
        let (current_label, previous_label) = self.labels();
        let (current, previous) = (&comparison.current, &comparison.previous);

        lines.push(format!(
            "  [{current_label}] vs [{previous_label}]        ← Tab {}",
            i18n.t("compare.keyToggle")
        ));
        lines.push(String::new());

        let header = Self::table_row(
            &i18n.t("compare.metric"),
            &previous_label,
            &current_label,
            &i18n.t("compare.change"),
        );
        lines.push(theme::heading(&header).to_string());
        lines.push(separator(SEPARATOR_WIDTH));

        let trend = |t: &TrendResult| format_trend(t, i18n);
        let settings = &self.services.settings;
        let rows = [
            (
                "compare.avgSession",
                percent_label(previous.stats.avg_session),
                percent_label(current.stats.avg_session),
                trend(&comparison.session),
            ),
            (
                "compare.avgWeekly",
                percent_label(previous.stats.avg_weekly),
                percent_label(current.stats.avg_weekly),
                trend(&comparison.weekly),
            ),
            (
                "compare.totalTokens",
                format_tokens(previous.stats.total_tokens),
                format_tokens(current.stats.total_tokens),
                trend(&comparison.tokens),
            ),
            (
                "compare.estimatedCost",
                format_cost(previous.total_cost_usd, settings),
                format_cost(current.total_cost_usd, settings),
                trend(&comparison.cost),
            ),
        ];
        for (key, before, now, change) in rows {
            lines.push(Self::table_row(&i18n.t(key), &before, &now, &change));
        }
        lines.push(String::new());

        lines.push(theme::heading(&format!("  {}", i18n.t("compare.trendGraph"))).to_string());
        lines.push(separator(SEPARATOR_WIDTH));
        for (label, period) in [(&previous_label, previous), (&current_label, current)] {
            lines.push(bar_line(label, period.stats.avg_session, PROGRESS_BAR_WIDTH));
        }
        lines.push(String::new());
        lines.push(theme::muted(&format!("  {}", i18n.t("compare.keyNav"))).to_string());
    }
}

impl Component for CompareView {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn init(&mut self, _ctx: &mut AppContext) {
        if self.pending.is_none() && self.result.is_none() {
            self.load();
        }
    }

    fn render(&self) -> Vec<String> {
        let i18n = &self.services.i18n;
        let hint = format!("[ESC {}]", i18n.t("compare.keyBack"));
        let mut lines = vec![
            header_line(&i18n.t("compare.title"), &hint, HEADER_WIDTH),
            String::new(),
        ];

        if self.pending.is_some() {
            lines.push(theme::muted(&format!("  {}", i18n.t("compare.loading"))).to_string());
        } else if let Some(error) = &self.error {
            lines.push(theme::negative(&format!("  {}: {error}", i18n.t("error.prefix"))).to_string());
            lines.push(String::new());
            lines.push(format!("  {}: ESC", i18n.t("compare.keyBack")));
        } else if let Some(comparison) = &self.result {
            self.render_result(comparison, &mut lines);
            if let Some(notice) = self.skipped.notice(i18n) {
                lines.push(format!("  {notice}"));
            }
        } else {
            lines.push(theme::muted(&format!("  {}", i18n.t("compare.noData"))).to_string());
        }
        lines
    }

    fn handle_key(&mut self, key: &KeyEvent, ctx: &mut AppContext) -> bool {
        match key.name {
            KeyName::Escape | KeyName::Char('q') if !key.ctrl => {
                ctx.pop();
                true
            }
            KeyName::Tab => {
                self.toggle_mode();
                true
            }
            _ => false,
        }
    }

    fn poll_updates(&mut self) -> bool {
        let Some(load) = self.pending.as_mut() else {
            return false;
        };
        let outcome = match load.poll() {
            LoadPoll::Pending => return false,
            LoadPoll::Ready(outcome) => outcome,
            LoadPoll::Lost => Err(ClusageError::Config(
                "comparison load ended without a result".to_string(),
            )),
        };
        self.pending = None;
        match outcome {
            Ok((comparison, skipped)) => {
                self.result = Some(comparison);
                self.skipped = skipped;
                self.error = None;
            }
            Err(e) => {
                warn!("Failed to load comparison: {}", e);
                self.result = None;
                self.skipped = SkippedDays::default();
                self.error = Some(e.to_string());
            }
        }
        self.base.mark_dirty();
        true
    }

    fn footer(&self) -> Option<String> {
        let i18n = &self.services.i18n;
        Some(format_key_help(&[
            ("Tab", i18n.t("compare.keyToggle")),
            ("ESC/q", i18n.t("compare.keyBack")),
        ]))
    }
}
