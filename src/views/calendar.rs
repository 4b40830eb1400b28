//! Month calendar, the viewer's home screen
//!
//! The calendar shows one month as a 6×7 grid, marks the days that have
//! recorded usage and summarises the selected day underneath. Month data is
//! read once per `YYYY-MM` and cached for the lifetime of the view, so
//! paging back to a month already seen costs no storage read.
//!
//! From here the user opens the other screens: Enter pushes the
//! [`DetailView`] for the selected day, `c` the [`CompareView`] and Tab the
//! [`HistogramView`] anchored to the selected day.

use chrono::{Datelike, NaiveDate};
use clusage_core::{ClusageError, DailyUsageFile, HistoryReadResult, Result};
use clusage_terminal::input::format_key_help;
use clusage_terminal::text::{self, Align};
use clusage_terminal::{
    AppContext, BackgroundLoad, Component, ComponentBase, Grid, KeyEvent, KeyName, LoadPoll,
    glyphs, theme,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::{CompareView, DetailView, HistogramView, SkippedDays, ViewerServices};
use crate::aggregation::{AggregatedData, calculate_stats};
use crate::periods::{
    build_calendar_grid, format_month_year, month_range, shift_month, weekday_headers,
};

/// Width the month header is centred in
const BOX_WIDTH: usize = 32;
/// Width of the info panel's utilization bars
const INFO_BAR_WIDTH: usize = 8;

/// Cache key of a month
pub fn month_key(year: i32, month: u32) -> String {
    format!("{year}-{month:02}")
}

#[derive(Debug, Default)]
struct MonthData {
    data: Vec<DailyUsageFile>,
    dates_with_data: HashSet<NaiveDate>,
    skipped: SkippedDays,
}

impl MonthData {
    fn from_result(result: HistoryReadResult) -> Self {
        let dates_with_data = result
            .data
            .iter()
            .filter(|day| !day.records.is_empty())
            .map(|day| day.date)
            .collect();
        Self {
            skipped: SkippedDays::from_result("Calendar", &result),
            data: result.data,
            dates_with_data,
        }
    }

    fn day(&self, date: NaiveDate) -> Option<&DailyUsageFile> {
        self.data.iter().find(|day| day.date == date)
    }
}

type MonthLoad = BackgroundLoad<Result<HistoryReadResult>>;

pub struct CalendarView {
    base: ComponentBase,
    grid: Grid<Option<u32>>,
    services: ViewerServices,
    year: i32,
    month: u32,
    cache: HashMap<String, MonthData>,
    pending: Option<(String, MonthLoad)>,
    error: Option<String>,
}

impl CalendarView {
    /// A calendar on the current month with today selected
    pub fn new(services: ViewerServices) -> Result<Self> {
        let today = services.clock.today();
        let base = ComponentBase::new();
        let grid = Grid::new();
        base.adopt(grid.base());
        let mut view = Self {
            base,
            grid,
            services,
            year: today.year(),
            month: today.month(),
            cache: HashMap::new(),
            pending: None,
            error: None,
        };
        view.rebuild_grid()?;
        view.select_day(today.day());
        Ok(view)
    }

    pub fn year_month(&self) -> (i32, u32) {
        (self.year, self.month)
    }

    /// Date under the cursor
    pub fn selected_date(&self) -> Option<NaiveDate> {
        let day = (*self.grid.selected_item()?)?;
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the month has been read and cached
    pub fn is_cached(&self, year: i32, month: u32) -> bool {
        self.cache.contains_key(&month_key(year, month))
    }

    fn current_month(&self) -> Option<&MonthData> {
        self.cache.get(&month_key(self.year, self.month))
    }

    /// Cached file of `date`, if its month is loaded and the file exists
    pub fn day_data(&self, date: NaiveDate) -> Option<&DailyUsageFile> {
        self.cache.get(&month_key(date.year(), date.month()))?.day(date)
    }

    /// Days of the shown month whose files could not be read
    pub fn skipped_days(&self) -> &[NaiveDate] {
        self.current_month()
            .map(|month| month.skipped.dates())
            .unwrap_or_default()
    }

    pub fn has_data(&self, date: NaiveDate) -> bool {
        self.current_month()
            .is_some_and(|month| month.dates_with_data.contains(&date))
    }

    /// Statistics of the selected day, `None` without records
    pub fn selected_stats(&self) -> Option<AggregatedData> {
        let day = self.day_data(self.selected_date()?)?;
        (!day.records.is_empty()).then(|| calculate_stats(&day.records))
    }

    fn rebuild_grid(&mut self) -> Result<()> {
        let cells = build_calendar_grid(self.year, self.month)?;
        self.grid.set_items(cells);
        Ok(())
    }

    fn select_day(&mut self, day: u32) {
        let position = self.grid.items().iter().enumerate().find_map(|(r, row)| {
            row.iter().position(|cell| *cell == Some(day)).map(|c| (r, c))
        });
        match position {
            Some((row, col)) => self.grid.set_selection(row, col),
            None => {
                self.grid.select_first_filled();
            }
        }
    }

    /// Show `month` of `year` with its first day selected
    ///
    /// A month outside 1–12 is rejected before any state changes.
    pub fn set_month(&mut self, year: i32, month: u32) -> Result<()> {
        if !(1..=12).contains(&month) {
            return Err(ClusageError::InvalidMonth(month));
        }
        self.year = year;
        self.month = month;
        self.rebuild_grid()?;
        self.grid.select_first_filled();
        self.error = None;
        self.start_month_load();
        self.base.mark_dirty();
        Ok(())
    }

    fn change_month(&mut self, delta: i32) {
        let (year, month) = shift_month(self.year, self.month, delta);
        if let Err(e) = self.set_month(year, month) {
            warn!("Cannot move to {}-{:02}: {}", year, month, e);
        }
    }

    pub fn prev_month(&mut self) {
        self.change_month(-1);
    }

    pub fn next_month(&mut self) {
        self.change_month(1);
    }

    /// Read the shown month in the background unless it is cached
    ///
    /// A load still running for another month is dropped, which aborts it.
    fn start_month_load(&mut self) {
        let key = month_key(self.year, self.month);
        if self.cache.contains_key(&key) {
            debug!("Month {} served from cache", key);
            self.pending = None;
            return;
        }
        if self.pending.as_ref().is_some_and(|(k, _)| *k == key) {
            return;
        }
        match month_range(self.year, self.month) {
            Ok(range) => {
                debug!("Loading month {} ({})", key, range);
                let load = self.services.spawn_read(range.start, range.end);
                self.pending = Some((key, load));
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Read the shown month and wait for it
    ///
    /// Used once before the calendar is first drawn.
    pub async fn load_current_month(&mut self) {
        let key = month_key(self.year, self.month);
        if self.cache.contains_key(&key) {
            return;
        }
        let result = match month_range(self.year, self.month) {
            Ok(range) => self.services.reader.read_history(range.start, range.end).await,
            Err(e) => Err(e),
        };
        self.apply_month(key, result);
    }

    fn apply_month(&mut self, key: String, result: Result<HistoryReadResult>) {
        match result {
            Ok(result) => {
                debug!("Month {} loaded with {} file(s)", key, result.data.len());
                self.cache.insert(key, MonthData::from_result(result));
                self.error = None;
            }
            Err(e) => {
                warn!("Failed to load month {}: {}", key, e);
                self.error = Some(e.to_string());
            }
        }
        self.base.mark_dirty();
    }

    fn open_detail(&self, ctx: &mut AppContext) {
        let Some(date) = self.selected_date() else {
            return;
        };
        let day = self
            .day_data(date)
            .cloned()
            .unwrap_or_else(|| DailyUsageFile::empty(date));
        ctx.push(Box::new(DetailView::new(day, self.services.clone())));
    }

    fn open_histogram(&self, ctx: &mut AppContext) {
        let anchor = self
            .selected_date()
            .unwrap_or_else(|| self.services.clock.today());
        ctx.push(Box::new(HistogramView::new(anchor, self.services.clone())));
    }

    fn render_cell(&self, row: usize, col: usize, day: u32) -> String {
        let label = text::pad(&day.to_string(), 3, Align::Right);
        let date = NaiveDate::from_ymd_opt(self.year, self.month, day);
        let styled = if self.grid.selected_position() == (row, col) {
            theme::selected(&label).to_string()
        } else if date == Some(self.services.clock.today()) {
            theme::today(&label).to_string()
        } else if !date.is_some_and(|d| self.has_data(d)) {
            theme::muted(&label).to_string()
        } else {
            label
        };
        format!("{styled} ")
    }

    fn render_info(&self, lines: &mut Vec<String>) {
        let i18n = &self.services.i18n;
        let Some(date) = self.selected_date() else {
            return;
        };
        let label = i18n.t_with("calendar.selected", &[("day", &date.day())]);
        lines.push(theme::heading(&format!("[{label}]")).to_string());

        if self.pending.is_some() && self.current_month().is_none() {
            lines.push(theme::muted(&i18n.t("common.loading")).to_string());
        } else if let Some(stats) = self.selected_stats() {
            lines.push(format!(
                "{}: {} {}% | {}: {} {}%",
                i18n.t("calendar.sessionLabel"),
                glyphs::progress_bar(stats.avg_session, INFO_BAR_WIDTH),
                text::percent(stats.avg_session),
                i18n.t("calendar.weeklyLabel"),
                glyphs::progress_bar(stats.avg_weekly, INFO_BAR_WIDTH),
                text::percent(stats.avg_weekly),
            ));
            lines.push(format!(
                "{} | {}",
                i18n.t_with("calendar.records", &[("count", &stats.count)]),
                i18n.t_with(
                    "calendar.tokens",
                    &[("count", &text::format_number(stats.total_tokens))]
                ),
            ));
        } else {
            lines.push(theme::muted(&i18n.t("calendar.noData")).to_string());
        }

        if let Some(notice) = self.current_month().and_then(|month| month.skipped.notice(i18n)) {
            lines.push(notice);
        }
        if let Some(error) = &self.error {
            lines.push(theme::negative(&format!("{}: {}", i18n.t("error.prefix"), error)).to_string());
        }
    }
}

impl Component for CalendarView {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn render(&self) -> Vec<String> {
        let i18n = &self.services.i18n;
        let mut lines = Vec::new();

        let header = format!("  ◀  {}  ▶  ", format_month_year(self.year, self.month, i18n));
        lines.push(theme::title(&text::pad(&header, BOX_WIDTH, Align::Center)).to_string());
        lines.push(String::new());

        let weekdays = weekday_headers(i18n)
            .iter()
            .map(|w| text::pad(w, 3, Align::Center))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(theme::muted(&weekdays).to_string());

        for (r, row) in self.grid.items().iter().enumerate() {
            let line: String = row
                .iter()
                .enumerate()
                .map(|(c, cell)| match cell {
                    Some(day) => self.render_cell(r, c, *day),
                    None => "    ".to_string(),
                })
                .collect();
            lines.push(line);
        }
        lines.push(String::new());

        self.render_info(&mut lines);
        lines
    }

    fn handle_key(&mut self, key: &KeyEvent, ctx: &mut AppContext) -> bool {
        match key.name {
            KeyName::Char('[') | KeyName::PageUp => {
                self.prev_month();
                true
            }
            KeyName::Char(']') | KeyName::PageDown => {
                self.next_month();
                true
            }
            KeyName::Return => {
                self.open_detail(ctx);
                true
            }
            KeyName::Char('c') if !key.ctrl => {
                ctx.push(Box::new(CompareView::new(self.services.clone())));
                true
            }
            KeyName::Tab => {
                self.open_histogram(ctx);
                true
            }
            KeyName::Escape | KeyName::Char('q') if !key.ctrl => {
                ctx.exit();
                true
            }
            _ => self.grid.navigate_filled(key),
        }
    }

    fn poll_updates(&mut self) -> bool {
        let Some((_, load)) = self.pending.as_mut() else {
            return false;
        };
        match load.poll() {
            LoadPoll::Pending => false,
            LoadPoll::Ready(result) => {
                if let Some((key, _)) = self.pending.take() {
                    self.apply_month(key, result);
                }
                true
            }
            LoadPoll::Lost => {
                if let Some((key, _)) = self.pending.take() {
                    warn!("Load of month {} ended without a result", key);
                    self.error = Some(self.services.i18n.t("calendar.loadError"));
                }
                self.base.mark_dirty();
                true
            }
        }
    }

    fn footer(&self) -> Option<String> {
        let i18n = &self.services.i18n;
        Some(format_key_help(&[
            ("←→↑↓", i18n.t("calendar.keyNav")),
            ("[/]", i18n.t("calendar.keyMonth")),
            ("Enter", i18n.t("calendar.keyDetail")),
            ("c", i18n.t("calendar.keyCompare")),
            ("Tab", i18n.t("calendar.keyHistogram")),
            ("q", i18n.t("calendar.keyExit")),
        ]))
    }
}
