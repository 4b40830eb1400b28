//! Vertical bar charts of usage over time
//!
//! The histogram has three primary modes: the hours of one day, the last N
//! ISO weeks and the last N months (N between 1 and 12). Each bar is the
//! average session utilization of its bucket; selecting a bar shows the
//! bucket's figures and, for weeks and months, the trend against the bar
//! before it.
//!
//! The comparison overlay (`c`) draws two periods in the same bar, with
//! distinct glyphs for the part only the current period reaches, the part
//! only the previous one reaches and the part both cover:
//!
//! | sub-mode | current          | previous               |
//! |----------|------------------|------------------------|
//! | hourly   | today            | yesterday              |
//! | daily    | this week        | last week, by weekday  |
//! | weekly   | the last N weeks | the N weeks before     |
//! | monthly  | the last N months| the N months before    |
//!
//! A summary under the overlay gives the count-weighted average of both
//! periods and the bars with the largest rise and fall.

use chrono::{Datelike, Duration, NaiveDate};
use chrono_tz::Tz;
use clusage_core::{ClusageError, HistoryReadResult, HistoryReader, I18n, Result};
use clusage_terminal::input::format_key_help;
use clusage_terminal::text::{self, Align};
use clusage_terminal::{
    AppContext, BackgroundLoad, Component, ComponentBase, KeyEvent, KeyName, LoadPoll, glyphs,
    theme,
};
use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use super::{SkippedDays, ViewerServices};
use crate::aggregation::{
    HourlyData, MonthlyData, PeriodStats, WeeklyData, aggregate_by_weekday, aggregate_hourly,
    calculate_trend, iso_week,
};
use crate::format::{arrow_change, format_cost, format_trend_line, header_line, separator};
use crate::periods::{DateRange, month_offset_range, week_range};

/// Rows of the chart, one per 20% step
pub const HISTOGRAM_HEIGHT: usize = 6;
/// Columns per bar including the gap
const BAR_WIDTH: usize = 4;
pub const MIN_RANGE: usize = 1;
pub const MAX_RANGE: usize = 12;
pub const DEFAULT_WEEK_COUNT: usize = 4;
pub const DEFAULT_MONTH_COUNT: usize = 6;
const HEADER_WIDTH: usize = 56;
const SEPARATOR_WIDTH: usize = 52;
const DETAIL_BAR_WIDTH: usize = 20;
const Y_LABELS: [&str; HISTOGRAM_HEIGHT] = ["100%", " 80%", " 60%", " 40%", " 20%", "  0%"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramMode {
    Hourly,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareSubMode {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl From<HistogramMode> for CompareSubMode {
    fn from(mode: HistogramMode) -> Self {
        match mode {
            HistogramMode::Hourly => Self::Hourly,
            HistogramMode::Weekly => Self::Weekly,
            HistogramMode::Monthly => Self::Monthly,
        }
    }
}

/// Figures behind one bar of a primary mode
#[derive(Debug, Clone, PartialEq)]
pub enum BarDetail {
    Hour(HourlyData),
    Week(WeeklyData),
    Month(MonthlyData),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub detail: BarDetail,
}

/// One bar of the comparison overlay
#[derive(Debug, Clone, PartialEq)]
pub struct CompareBar {
    pub label: String,
    pub current: f64,
    pub previous: f64,
    /// Records behind `current`
    pub current_count: usize,
    /// Records behind `previous`
    pub previous_count: usize,
}

impl CompareBar {
    /// Relative change of this bar; a rise from zero counts as +100%
    pub fn change_percent(&self) -> f64 {
        relative_change(self.current, self.previous)
    }
}

fn relative_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChange {
    pub label: String,
    pub change_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompareSummary {
    pub current_avg: f64,
    pub previous_avg: f64,
    pub change_percent: f64,
    pub max_increase: Option<BarChange>,
    pub max_decrease: Option<BarChange>,
}

fn weighted_mean(values: impl Iterator<Item = (f64, usize)>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), (value, n)| {
        (sum + value * n as f64, count + n)
    });
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Averages of both periods weighted by record count, and the extreme bars
pub fn summarize(bars: &[CompareBar]) -> CompareSummary {
    let current_avg = weighted_mean(bars.iter().map(|b| (b.current, b.current_count)));
    let previous_avg = weighted_mean(bars.iter().map(|b| (b.previous, b.previous_count)));

    let mut max_increase: Option<BarChange> = None;
    let mut max_decrease: Option<BarChange> = None;
    for bar in bars {
        let delta = bar.current - bar.previous;
        let change = BarChange {
            label: bar.label.clone(),
            change_percent: bar.change_percent(),
        };
        if delta > 0.0 {
            if max_increase
                .as_ref()
                .is_none_or(|best| change.change_percent > best.change_percent)
            {
                max_increase = Some(change);
            }
        } else if delta < 0.0
            && max_decrease
                .as_ref()
                .is_none_or(|best| change.change_percent < best.change_percent)
        {
            max_decrease = Some(change);
        }
    }

    CompareSummary {
        current_avg,
        previous_avg,
        change_percent: relative_change(current_avg, previous_avg),
        max_increase,
        max_decrease,
    }
}

/// What a background load produces
#[derive(Debug)]
enum Loaded {
    Bars(Vec<Bar>),
    Compare(Vec<CompareBar>),
}

/// A chart request, resolved off the event loop
#[derive(Debug, Clone, Copy)]
enum Query {
    Hourly(NaiveDate),
    Weekly(usize),
    Monthly(usize),
    Compare(CompareSubMode, usize),
}

struct QueryEnv {
    reader: Arc<dyn HistoryReader>,
    tz: Tz,
    today: NaiveDate,
    i18n: I18n,
    /// Unreadable days across every read of one query
    skipped: Mutex<SkippedDays>,
}

impl QueryEnv {
    async fn read(&self, range: DateRange) -> Result<HistoryReadResult> {
        let result = self.reader.read_history(range.start, range.end).await?;
        self.skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record("Histogram", &result);
        Ok(result)
    }

    async fn period(&self, range: DateRange) -> Result<PeriodStats> {
        let result = self.read(range).await?;
        Ok(PeriodStats::from_days(range.start, range.end, &result.data))
    }

    async fn hours(&self, date: NaiveDate) -> Result<Vec<HourlyData>> {
        let result = self.read(DateRange::day(date)).await?;
        Ok(aggregate_hourly(&result.records(), self.tz))
    }

    fn month_label(&self, month: u32) -> String {
        self.i18n
            .list("histogram.monthNames")
            .get(month.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_else(|| format!("{month}{}", self.i18n.t("histogram.monthLabel")))
    }

    async fn week(&self, offset: i64) -> Result<WeeklyData> {
        let range = week_range(self.today, offset);
        Ok(WeeklyData {
            week: iso_week(range.start),
            period: self.period(range).await?,
        })
    }

    async fn month(&self, offset: i32) -> Result<MonthlyData> {
        let range = month_offset_range(self.today, offset)?;
        Ok(MonthlyData {
            year: range.start.year(),
            month: range.start.month(),
            period: self.period(range).await?,
        })
    }

    fn week_bar(&self, data: WeeklyData) -> Bar {
        Bar {
            label: data.label(),
            value: data.period.stats.avg_session,
            detail: BarDetail::Week(data),
        }
    }

    fn month_bar(&self, data: MonthlyData) -> Bar {
        Bar {
            label: self.month_label(data.month),
            value: data.period.stats.avg_session,
            detail: BarDetail::Month(data),
        }
    }

    async fn fetch(self, query: Query) -> Result<(Loaded, SkippedDays)> {
        let loaded = self.resolve(query).await?;
        let skipped = self.skipped.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok((loaded, skipped))
    }

    async fn resolve(&self, query: Query) -> Result<Loaded> {
        debug!("Histogram query {:?}", query);
        match query {
            Query::Hourly(date) => {
                let bars = self
                    .hours(date)
                    .await?
                    .into_iter()
                    .map(|hour| Bar {
                        label: format!("{:02}", hour.hour),
                        value: hour.avg_session,
                        detail: BarDetail::Hour(hour),
                    })
                    .collect();
                Ok(Loaded::Bars(bars))
            }
            Query::Weekly(count) => {
                let weeks = try_join_all((0..count as i64).rev().map(|i| self.week(-i))).await?;
                Ok(Loaded::Bars(weeks.into_iter().map(|w| self.week_bar(w)).collect()))
            }
            Query::Monthly(count) => {
                let months = try_join_all((0..count as i32).rev().map(|i| self.month(-i))).await?;
                Ok(Loaded::Bars(months.into_iter().map(|m| self.month_bar(m)).collect()))
            }
            Query::Compare(mode, count) => Ok(Loaded::Compare(self.compare(mode, count).await?)),
        }
    }

    async fn compare(&self, mode: CompareSubMode, count: usize) -> Result<Vec<CompareBar>> {
        match mode {
            CompareSubMode::Hourly => {
                let yesterday = self.today - Duration::days(1);
                let (today, before) =
                    futures::try_join!(self.hours(self.today), self.hours(yesterday))?;
                let hours: BTreeSet<u32> =
                    today.iter().chain(before.iter()).map(|h| h.hour).collect();
                let find = |list: &[HourlyData], hour| list.iter().find(|h| h.hour == hour).copied();
                Ok(hours
                    .into_iter()
                    .map(|hour| {
                        let current = find(&today, hour).unwrap_or_default();
                        let previous = find(&before, hour).unwrap_or_default();
                        CompareBar {
                            label: format!("{hour:02}"),
                            current: current.avg_session,
                            previous: previous.avg_session,
                            current_count: current.count,
                            previous_count: previous.count,
                        }
                    })
                    .collect())
            }
            CompareSubMode::Daily => {
                let (this_week, last_week) = futures::try_join!(
                    self.read(week_range(self.today, 0)),
                    self.read(week_range(self.today, -1)),
                )?;
                let current = aggregate_by_weekday(&this_week.data);
                let previous = aggregate_by_weekday(&last_week.data);
                let names = self.i18n.list("histogram.dayNames");
                Ok((0..7)
                    .map(|day| {
                        let now = current[day].unwrap_or_default();
                        let before = previous[day].unwrap_or_default();
                        CompareBar {
                            label: names.get(day).cloned().unwrap_or_else(|| day.to_string()),
                            current: now.avg_session,
                            previous: before.avg_session,
                            current_count: now.count,
                            previous_count: before.count,
                        }
                    })
                    .collect())
            }
            CompareSubMode::Weekly => {
                let n = count as i64;
                let pairs = try_join_all((0..n).rev().map(|i| async move {
                    futures::try_join!(self.week(-i), self.week(-i - n))
                }))
                .await?;
                Ok(pairs
                    .into_iter()
                    .map(|(current, previous)| CompareBar {
                        label: current.label(),
                        current: current.period.stats.avg_session,
                        previous: previous.period.stats.avg_session,
                        current_count: current.period.stats.count,
                        previous_count: previous.period.stats.count,
                    })
                    .collect())
            }
            CompareSubMode::Monthly => {
                let n = count as i32;
                let pairs = try_join_all((0..n).rev().map(|i| async move {
                    futures::try_join!(self.month(-i), self.month(-i - n))
                }))
                .await?;
                Ok(pairs
                    .into_iter()
                    .map(|(current, previous)| CompareBar {
                        label: self.month_label(current.month),
                        current: current.period.stats.avg_session,
                        previous: previous.period.stats.avg_session,
                        current_count: current.period.stats.count,
                        previous_count: previous.period.stats.count,
                    })
                    .collect())
            }
        }
    }
}

/// Filled rows of a bar for `value`
fn bar_height(value: f64) -> usize {
    (text::clamp_unit(value) * HISTOGRAM_HEIGHT as f64).round() as usize
}

pub struct HistogramView {
    base: ComponentBase,
    services: ViewerServices,
    mode: HistogramMode,
    date: NaiveDate,
    week_count: usize,
    month_count: usize,
    selected: usize,
    bars: Vec<Bar>,
    compare_active: bool,
    compare_mode: CompareSubMode,
    compare_bars: Vec<CompareBar>,
    summary: Option<CompareSummary>,
    error: Option<String>,
    skipped: SkippedDays,
    pending: Option<BackgroundLoad<Result<(Loaded, SkippedDays)>>>,
}

impl HistogramView {
    /// An hourly histogram of `date`; data is read once the view is pushed
    pub fn new(date: NaiveDate, services: ViewerServices) -> Self {
        Self {
            base: ComponentBase::new(),
            services,
            mode: HistogramMode::Hourly,
            date,
            week_count: DEFAULT_WEEK_COUNT,
            month_count: DEFAULT_MONTH_COUNT,
            selected: 0,
            bars: Vec::new(),
            compare_active: false,
            compare_mode: CompareSubMode::Hourly,
            compare_bars: Vec::new(),
            summary: None,
            error: None,
            skipped: SkippedDays::default(),
            pending: None,
        }
    }

    pub fn mode(&self) -> HistogramMode {
        self.mode
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn week_count(&self) -> usize {
        self.week_count
    }

    pub fn month_count(&self) -> usize {
        self.month_count
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn is_compare_mode(&self) -> bool {
        self.compare_active
    }

    pub fn compare_mode(&self) -> CompareSubMode {
        self.compare_mode
    }

    pub fn compare_bars(&self) -> &[CompareBar] {
        &self.compare_bars
    }

    pub fn compare_summary(&self) -> Option<&CompareSummary> {
        self.summary.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Days read for the shown chart whose files could not be parsed
    pub fn skipped_days(&self) -> &[NaiveDate] {
        self.skipped.dates()
    }

    fn query(&self) -> Query {
        if self.compare_active {
            let count = match self.compare_mode {
                CompareSubMode::Monthly => self.month_count,
                _ => self.week_count,
            };
            return Query::Compare(self.compare_mode, count);
        }
        match self.mode {
            HistogramMode::Hourly => Query::Hourly(self.date),
            HistogramMode::Weekly => Query::Weekly(self.week_count),
            HistogramMode::Monthly => Query::Monthly(self.month_count),
        }
    }

    /// Start reading whatever the current mode shows
    ///
    /// Any load still running is dropped and thereby aborted.
    pub fn load(&mut self) {
        self.error = None;
        let env = QueryEnv {
            reader: Arc::clone(&self.services.reader),
            tz: self.services.clock.tz(),
            today: self.services.clock.today(),
            i18n: self.services.i18n,
            skipped: Mutex::default(),
        };
        let query = self.query();
        self.pending = Some(self.services.spawn(env.fetch(query)));
        self.base.mark_dirty();
    }

    pub fn set_mode(&mut self, mode: HistogramMode) {
        if self.mode != mode {
            self.mode = mode;
            self.selected = 0;
            self.load();
        }
    }

    pub fn set_compare_mode(&mut self, mode: CompareSubMode) {
        if self.compare_mode != mode {
            self.compare_mode = mode;
            self.selected = 0;
            self.load();
        }
    }

    /// Switch the comparison overlay on or off
    ///
    /// Entering starts on the sub-mode matching the current primary mode.
    pub fn toggle_compare(&mut self) {
        self.compare_active = !self.compare_active;
        self.selected = 0;
        if self.compare_active {
            self.compare_mode = self.mode.into();
        }
        self.load();
    }

    fn bar_count(&self) -> usize {
        if self.compare_active {
            self.compare_bars.len()
        } else {
            self.bars.len()
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let target = self.selected as isize + delta;
        if target >= 0 && (target as usize) < self.bar_count() {
            self.selected = target as usize;
            self.base.mark_dirty();
        }
    }

    fn resize_range(count: usize, delta: isize) -> Option<usize> {
        let next = count as isize - delta;
        (MIN_RANGE as isize..=MAX_RANGE as isize)
            .contains(&next)
            .then_some(next as usize)
    }

    /// Up (`-1`) widens week and month ranges or steps back a day; down
    /// narrows or steps forward
    fn change_range(&mut self, delta: isize) {
        let target = if self.compare_active {
            match self.compare_mode {
                CompareSubMode::Weekly => Some(HistogramMode::Weekly),
                CompareSubMode::Monthly => Some(HistogramMode::Monthly),
                CompareSubMode::Hourly | CompareSubMode::Daily => None,
            }
        } else {
            Some(self.mode)
        };
        match target {
            Some(HistogramMode::Hourly) => {
                self.date += Duration::days(delta as i64);
                self.load();
            }
            Some(HistogramMode::Weekly) => {
                if let Some(count) = Self::resize_range(self.week_count, delta) {
                    self.week_count = count;
                    self.load();
                }
            }
            Some(HistogramMode::Monthly) => {
                if let Some(count) = Self::resize_range(self.month_count, delta) {
                    self.month_count = count;
                    self.load();
                }
            }
            None => {}
        }
    }

    fn apply(&mut self, outcome: Result<(Loaded, SkippedDays)>) {
        match outcome {
            Ok((loaded, skipped)) => {
                match loaded {
                    Loaded::Bars(bars) => self.bars = bars,
                    Loaded::Compare(bars) => {
                        self.summary = Some(summarize(&bars));
                        self.compare_bars = bars;
                    }
                }
                self.skipped = skipped;
                self.error = None;
            }
            Err(e) => {
                warn!("Failed to load histogram data: {}", e);
                self.skipped = SkippedDays::default();
                self.error = Some(e.to_string());
            }
        }
        self.selected = self.selected.min(self.bar_count().saturating_sub(1));
        self.base.mark_dirty();
    }

    fn period_labels(&self) -> (String, String) {
        let (current, previous) = match self.compare_mode {
            CompareSubMode::Hourly => ("histogram.today", "histogram.yesterday"),
            CompareSubMode::Daily | CompareSubMode::Weekly => {
                ("histogram.thisWeek", "histogram.lastWeek")
            }
            CompareSubMode::Monthly => ("compare.thisMonth", "compare.lastMonth"),
        };
        let i18n = &self.services.i18n;
        (i18n.t(current), i18n.t(previous))
    }

    fn mode_line(&self, labels: &[(&str, bool)], keys: &str) -> String {
        let i18n = &self.services.i18n;
        let rendered = labels
            .iter()
            .map(|(key, active)| {
                let label = i18n.t(key);
                if *active {
                    theme::active(&format!("[{label}]")).to_string()
                } else {
                    label
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        format!("  {}: {rendered}  ← {keys}", i18n.t("histogram.keyMode"))
    }

    fn range_label(&self, mode: HistogramMode) -> String {
        let i18n = &self.services.i18n;
        let inner = match mode {
            HistogramMode::Hourly => self.date.to_string(),
            HistogramMode::Weekly => {
                i18n.t_with("histogram.recentWeeks", &[("count", &self.week_count)])
            }
            HistogramMode::Monthly => {
                i18n.t_with("histogram.recentMonths", &[("count", &self.month_count)])
            }
        };
        format!("  [◀ {inner} ▶]")
    }

    /// Loading and error lines; `true` when the chart must not be drawn
    fn render_status(&self, lines: &mut Vec<String>) -> bool {
        let i18n = &self.services.i18n;
        if self.pending.is_some() {
            lines.push(theme::muted(&format!("  {}", i18n.t("histogram.loading"))).to_string());
            return true;
        }
        if let Some(error) = &self.error {
            lines.push(
                theme::negative(&format!("  {}: {error}", i18n.t("histogram.loadError")))
                    .to_string(),
            );
            return true;
        }
        if let Some(notice) = self.skipped.notice(i18n) {
            lines.push(format!("  {notice}"));
        }
        false
    }

    fn x_axis(lines: &mut Vec<String>, labels: impl Iterator<Item = (String, bool)>, count: usize) {
        lines.push(format!("       └{}", glyphs::rule(count * BAR_WIDTH + 2)));
        let mut label_line = String::from("       ");
        for (label, selected) in labels {
            let padded = text::pad(&label, BAR_WIDTH, Align::Left);
            if selected {
                label_line.push_str(&theme::active(&padded).to_string());
            } else {
                label_line.push_str(&padded);
            }
        }
        lines.push(label_line);
    }

    fn render_bars(&self, lines: &mut Vec<String>) {
        if self.bars.is_empty() {
            let text = theme::muted(&self.services.i18n.t("histogram.noData")).to_string();
            lines.push(format!("  {text}"));
            return;
        }
        for (row, y_label) in Y_LABELS.iter().enumerate() {
            let from_bottom = HISTOGRAM_HEIGHT - row;
            let mut line = format!("  {y_label}│");
            for (index, bar) in self.bars.iter().enumerate() {
                if from_bottom <= bar_height(bar.value) {
                    let selected = index == self.selected;
                    let cell = if selected { "██" } else { "▓▓" };
                    let warn = bar.value >= glyphs::WARNING_THRESHOLD;
                    let styled = match (warn, selected) {
                        (true, true) => theme::emphasis(cell),
                        (true, false) => theme::warning(cell),
                        (false, true) => theme::accent(cell),
                        (false, false) => theme::positive(cell),
                    };
                    line.push_str(&styled.to_string());
                } else {
                    line.push_str("  ");
                }
                line.push_str("  ");
            }
            lines.push(line);
        }
        let labels = self
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.label.clone(), i == self.selected));
        Self::x_axis(lines, labels, self.bars.len());
    }

    fn detail_bars(&self, lines: &mut Vec<String>, avg_session: f64, avg_weekly: f64, tokens: u64) {
        let i18n = &self.services.i18n;
        for (key, value) in [
            ("histogram.avgSession", avg_session),
            ("histogram.avgWeekly", avg_weekly),
        ] {
            lines.push(format!(
                "  {}: {} {}%",
                i18n.t(key),
                glyphs::progress_bar(value, DETAIL_BAR_WIDTH),
                text::percent(value)
            ));
        }
        lines.push(format!(
            "  {}: {}",
            i18n.t("histogram.totalTokens"),
            text::format_number(tokens)
        ));
    }

    fn previous_session(&self) -> Option<f64> {
        let previous = self.bars.get(self.selected.checked_sub(1)?)?;
        Some(previous.value)
    }

    fn render_selected_detail(&self, lines: &mut Vec<String>) {
        let Some(bar) = self.bars.get(self.selected) else {
            return;
        };
        let i18n = &self.services.i18n;
        lines.push(String::new());
        lines.push(separator(SEPARATOR_WIDTH));

        let (title, period, trend_unit) = match &bar.detail {
            BarDetail::Hour(hour) => {
                let title = format!("  {}:00 {}", hour.hour, i18n.t("histogram.hourLabel"));
                lines.push(theme::emphasis(&title).to_string());
                lines.push(String::new());
                self.detail_bars(lines, hour.avg_session, hour.avg_weekly, hour.total_tokens);
                return;
            }
            BarDetail::Week(week) => (
                format!("  {} ({})", week.label(), DateRange::new(week.period.start, week.period.end)),
                &week.period,
                "histogram.weekLabel",
            ),
            BarDetail::Month(month) => (
                format!(
                    "  {}",
                    i18n.t_with(
                        "histogram.yearFormat",
                        &[("year", &month.year), ("month", &bar.label)]
                    )
                ),
                &month.period,
                "histogram.monthLabel",
            ),
        };

        lines.push(theme::emphasis(&title).to_string());
        lines.push(String::new());
        self.detail_bars(
            lines,
            period.stats.avg_session,
            period.stats.avg_weekly,
            period.stats.total_tokens,
        );
        lines.push(format!(
            "  {}: {}",
            i18n.t("histogram.estimatedCost"),
            format_cost(period.total_cost_usd, &self.services.settings)
        ));
        if let Some(previous) = self.previous_session() {
            let trend = calculate_trend(bar.value, previous);
            lines.push(format!(
                "  {}",
                format_trend_line(&trend, &i18n.t(trend_unit), i18n)
            ));
        }
    }

    fn render_primary(&self) -> Vec<String> {
        let i18n = &self.services.i18n;
        let hint = format!("[Tab {}]", i18n.t("histogram.keyBack"));
        let mut lines = vec![
            header_line(&i18n.t("histogram.title"), &hint, HEADER_WIDTH),
            String::new(),
            self.mode_line(
                &[
                    ("histogram.modeHourly", self.mode == HistogramMode::Hourly),
                    ("histogram.modeWeekly", self.mode == HistogramMode::Weekly),
                    ("histogram.modeMonthly", self.mode == HistogramMode::Monthly),
                ],
                "1, 2, 3",
            ),
            self.range_label(self.mode),
            String::new(),
        ];
        if self.render_status(&mut lines) {
            return lines;
        }
        self.render_bars(&mut lines);
        self.render_selected_detail(&mut lines);
        lines
    }

    fn render_compare_bars(&self, lines: &mut Vec<String>) {
        if self.compare_bars.is_empty() {
            let text = theme::muted(&self.services.i18n.t("histogram.noCompareData")).to_string();
            lines.push(format!("  {text}"));
            return;
        }
        let i18n = &self.services.i18n;
        let (current, previous) = self.period_labels();
        lines.push(format!(
            "  {} {}  {} {}",
            theme::muted("░░"),
            i18n.t_with("histogram.legendPrevious", &[("period", &previous)]),
            theme::positive("██"),
            i18n.t_with("histogram.legendCurrent", &[("period", &current)]),
        ));
        lines.push(String::new());

        for (row, y_label) in Y_LABELS.iter().enumerate() {
            let from_bottom = HISTOGRAM_HEIGHT - row;
            let mut line = format!("  {y_label}│");
            for (index, bar) in self.compare_bars.iter().enumerate() {
                let now = from_bottom <= bar_height(bar.current);
                let before = from_bottom <= bar_height(bar.previous);
                let cell = match (now, before) {
                    (true, true) => "▓▓",
                    (true, false) => "██",
                    (false, true) => "░░",
                    (false, false) => "  ",
                };
                if now || before {
                    let styled = if index == self.selected {
                        theme::active(cell)
                    } else if now && !before {
                        theme::positive(cell)
                    } else if before && !now {
                        theme::muted(cell)
                    } else {
                        theme::warning(cell)
                    };
                    line.push_str(&styled.to_string());
                } else {
                    line.push_str(cell);
                }
                line.push_str("  ");
            }
            lines.push(line);
        }
        let labels = self
            .compare_bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.label.clone(), i == self.selected));
        Self::x_axis(lines, labels, self.compare_bars.len());
    }

    fn render_compare_summary(&self, lines: &mut Vec<String>) {
        let Some(summary) = &self.summary else {
            return;
        };
        let i18n = &self.services.i18n;
        lines.push(String::new());
        lines.push(separator(SEPARATOR_WIDTH));
        lines.push(String::new());
        lines.push(format!(
            "  {}",
            i18n.t_with(
                "histogram.compareAvgChange",
                &[
                    ("previous", &text::percent(summary.previous_avg)),
                    ("current", &text::percent(summary.current_avg)),
                    ("change", &arrow_change(summary.change_percent)),
                ]
            )
        ));
        if let Some(best) = &summary.max_increase {
            let line = format!(
                "{}: {} (+{:.1}%)",
                i18n.t("histogram.maxIncrease"),
                best.label,
                best.change_percent
            );
            lines.push(format!("  {}", theme::positive(&line)));
        }
        if let Some(worst) = &summary.max_decrease {
            let line = format!(
                "{}: {} ({:.1}%)",
                i18n.t("histogram.maxDecrease"),
                worst.label,
                worst.change_percent
            );
            lines.push(format!("  {}", theme::negative(&line)));
        }
    }

    fn render_compare_detail(&self, lines: &mut Vec<String>) {
        let Some(bar) = self.compare_bars.get(self.selected) else {
            return;
        };
        let i18n = &self.services.i18n;
        let (current, previous) = self.period_labels();
        lines.push(String::new());
        lines.push(separator(SEPARATOR_WIDTH));
        lines.push(theme::emphasis(&format!("  {}", bar.label)).to_string());
        lines.push(String::new());
        for (label, value) in [(previous, bar.previous), (current, bar.current)] {
            lines.push(format!(
                "  {label}: {} {}%",
                glyphs::progress_bar(value, DETAIL_BAR_WIDTH),
                text::percent(value)
            ));
        }
        if bar.previous > 0.0 {
            lines.push(format!(
                "  {}: {}",
                i18n.t("compare.change"),
                arrow_change(bar.change_percent())
            ));
        } else if bar.current > 0.0 {
            lines.push(format!(
                "  {}: {}",
                i18n.t("compare.change"),
                theme::positive(&i18n.t("histogram.newData"))
            ));
        }
    }

    fn render_compare(&self) -> Vec<String> {
        let i18n = &self.services.i18n;
        let hint = format!("[c: {}]", i18n.t("histogram.exitCompare"));
        let mut lines = vec![
            header_line(&i18n.t("histogram.compareMode"), &hint, HEADER_WIDTH),
            String::new(),
            self.mode_line(
                &[
                    ("histogram.modeHourly", self.compare_mode == CompareSubMode::Hourly),
                    ("histogram.modeDaily", self.compare_mode == CompareSubMode::Daily),
                    ("histogram.modeWeekly", self.compare_mode == CompareSubMode::Weekly),
                    ("histogram.modeMonthly", self.compare_mode == CompareSubMode::Monthly),
                ],
                "1, 2, 3, 4",
            ),
        ];
        match self.compare_mode {
            CompareSubMode::Weekly => lines.push(self.range_label(HistogramMode::Weekly)),
            CompareSubMode::Monthly => lines.push(self.range_label(HistogramMode::Monthly)),
            CompareSubMode::Hourly | CompareSubMode::Daily => {}
        }
        lines.push(String::new());
        if self.render_status(&mut lines) {
            return lines;
        }
        self.render_compare_bars(&mut lines);
        self.render_compare_summary(&mut lines);
        self.render_compare_detail(&mut lines);
        lines
    }
}

impl Component for HistogramView {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn init(&mut self, _ctx: &mut AppContext) {
        if self.pending.is_none() {
            self.load();
        }
    }

    fn render(&self) -> Vec<String> {
        if self.compare_active {
            self.render_compare()
        } else {
            self.render_primary()
        }
    }

    fn handle_key(&mut self, key: &KeyEvent, ctx: &mut AppContext) -> bool {
        if key.ctrl || key.meta {
            return false;
        }
        match key.name {
            KeyName::Char('c') => self.toggle_compare(),
            KeyName::Char('1') if self.compare_active => self.set_compare_mode(CompareSubMode::Hourly),
            KeyName::Char('2') if self.compare_active => self.set_compare_mode(CompareSubMode::Daily),
            KeyName::Char('3') if self.compare_active => self.set_compare_mode(CompareSubMode::Weekly),
            KeyName::Char('4') if self.compare_active => {
                self.set_compare_mode(CompareSubMode::Monthly)
            }
            KeyName::Char('1') => self.set_mode(HistogramMode::Hourly),
            KeyName::Char('2') => self.set_mode(HistogramMode::Weekly),
            KeyName::Char('3') => self.set_mode(HistogramMode::Monthly),
            KeyName::Left => self.move_selection(-1),
            KeyName::Right => self.move_selection(1),
            KeyName::Up => self.change_range(-1),
            KeyName::Down => self.change_range(1),
            KeyName::Tab => ctx.pop(),
            KeyName::Escape | KeyName::Char('q') => ctx.exit(),
            _ => return false,
        }
        true
    }

    fn poll_updates(&mut self) -> bool {
        let Some(load) = self.pending.as_mut() else {
            return false;
        };
        let outcome = match load.poll() {
            LoadPoll::Pending => return false,
            LoadPoll::Ready(outcome) => outcome,
            LoadPoll::Lost => Err(ClusageError::Config(
                "histogram load ended without a result".to_string(),
            )),
        };
        self.pending = None;
        self.apply(outcome);
        true
    }

    fn footer(&self) -> Option<String> {
        let i18n = &self.services.i18n;
        Some(format_key_help(&[
            ("1-3", i18n.t("histogram.keyMode")),
            ("←→", i18n.t("histogram.keyMove")),
            ("↑↓", i18n.t("histogram.keyRange")),
            ("c", i18n.t("histogram.keyCompare")),
            ("Tab", i18n.t("histogram.keyBack")),
            ("q", i18n.t("calendar.keyExit")),
        ]))
    }
}
