//! Non-interactive usage summary
//!
//! Prints one table row per recorded day of the chosen period plus a
//! totals row, followed by a session usage graph drawn in the configured
//! `graphStyle`. With `--compare` it prints the current week or month
//! against the previous one instead. Works with redirected stdout, unlike
//! the viewer.
//!
//! ```bash
//! clusage summary --period week --cost
//! clusage summary --compare month
//! ```

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use clap::ValueEnum;
use clusage_core::settings::GraphStyle;
use clusage_core::{HistoryReader, I18n, Result, Settings};
use prettytable::{Cell, Row, Table, format, row};
use tracing::{info, warn};

use crate::aggregation::{
    AggregatedData, PeriodComparison, PeriodStats, TrendResult, aggregate_hourly, calculate_trend,
    flatten_records,
};
use crate::format::{bar_line, column, format_cost, percent_label};
use crate::periods::{DateRange, month_to_date_ranges, week_range};
use crate::views::CompareMode;
use clusage_terminal::glyphs::{BoxStyle, WARNING_THRESHOLD, fill_box};
use clusage_terminal::text::{Align, clamp_unit, format_number, visible_width};
use clusage_terminal::theme;

const BAR_GRAPH_WIDTH: usize = 30;
const LINE_GRAPH_HEIGHT: usize = 10;
const Y_LABEL_WIDTH: usize = 5;

/// Span covered by `clusage summary`, always ending today
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SummaryPeriod {
    #[default]
    Today,
    /// Monday to today
    Week,
    /// The 1st of the month to today
    Month,
}

impl SummaryPeriod {
    pub fn range(self, today: NaiveDate) -> Result<DateRange> {
        Ok(match self {
            Self::Today => DateRange::day(today),
            Self::Week => DateRange::new(week_range(today, 0).start, today),
            Self::Month => month_to_date_ranges(today)?.0,
        })
    }
}

/// One day of the summary table
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub date: NaiveDate,
    pub stats: AggregatedData,
    pub cost_usd: f64,
}

/// One labelled value of the usage graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPoint {
    pub label: String,
    pub value: f64,
}

impl GraphPoint {
    fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub range: DateRange,
    pub rows: Vec<SummaryRow>,
    pub total: PeriodStats,
    /// Average session utilization per hour for a single day, per day otherwise
    pub points: Vec<GraphPoint>,
    /// Days whose file could not be parsed
    pub skipped: usize,
}

impl SummaryReport {
    pub fn is_empty(&self) -> bool {
        self.total.stats.count == 0
    }
}

/// Read `range` and reduce every day with records to a row
///
/// `tz` places records in local hours for the graph of a single day.
pub async fn build_summary(
    reader: &dyn HistoryReader,
    range: DateRange,
    tz: Tz,
) -> Result<SummaryReport> {
    let result = reader.read_history(range.start, range.end).await?;
    for error in &result.errors {
        warn!("Skipping {}: {}", error.date, error.reason);
    }

    let rows: Vec<SummaryRow> = result
        .data
        .iter()
        .filter(|day| !day.records.is_empty())
        .map(|day| {
            let period = PeriodStats::from_days(day.date, day.date, std::slice::from_ref(day));
            SummaryRow {
                date: day.date,
                stats: period.stats,
                cost_usd: period.total_cost_usd,
            }
        })
        .collect();

    let points = if range.start == range.end {
        aggregate_hourly(&flatten_records(&result.data), tz)
            .iter()
            .map(|hour| GraphPoint::new(format!("{:02}", hour.hour), hour.avg_session))
            .collect()
    } else {
        rows.iter()
            .map(|row| GraphPoint::new(row.date.format("%m-%d").to_string(), row.stats.avg_session))
            .collect()
    };

    Ok(SummaryReport {
        range,
        rows,
        total: PeriodStats::from_days(range.start, range.end, &result.data),
        points,
        skipped: result.errors.len(),
    })
}

/// Render the report as a table
pub fn format_summary(
    report: &SummaryReport,
    i18n: &I18n,
    settings: &Settings,
    include_cost: bool,
) -> String {
    let title = i18n.t_with(
        "summary.title",
        &[("start", &report.range.start), ("end", &report.range.end)],
    );
    let mut output = format!("{title}\n\n");

    if report.is_empty() {
        output.push_str(&i18n.t("summary.noData"));
        output.push('\n');
    } else {
        output.push_str(&build_table(report, i18n, settings, include_cost).to_string());
        let title = if report.range.start == report.range.end {
            i18n.t("summary.graphHourly")
        } else {
            i18n.t("summary.graphDaily")
        };
        output.push('\n');
        for line in render_graph(&report.points, settings.graph_style(), &title) {
            output.push_str(&line);
            output.push('\n');
        }
    }

    push_skipped(&mut output, report.skipped, i18n);
    output
}

fn push_skipped(output: &mut String, skipped: usize, i18n: &I18n) {
    if skipped > 0 {
        output.push('\n');
        output.push_str(&i18n.t_with("summary.skipped", &[("count", &skipped)]));
        output.push('\n');
    }
}

fn warning_icon(value: f64) -> String {
    if value >= WARNING_THRESHOLD {
        format!(" {}", theme::warning("⚠"))
    } else {
        String::new()
    }
}

/// The graph of `points` in `style`, framed in a titled box
pub fn render_graph(points: &[GraphPoint], style: GraphStyle, title: &str) -> Vec<String> {
    if points.is_empty() {
        return Vec::new();
    }
    let content = match style {
        GraphStyle::Bar => bar_graph(points),
        GraphStyle::Line => line_graph(points),
    };
    let width = content.iter().map(|line| visible_width(line)).max().unwrap_or(0) + 2;
    fill_box(&content, width.max(visible_width(title) + 8), Some(title), BoxStyle::Round)
}

/// One `label: ████░░ 40%` line per point above a percent scale
pub fn bar_graph(points: &[GraphPoint]) -> Vec<String> {
    let label_width = points.iter().map(|p| visible_width(&p.label)).max().unwrap_or(0);
    let mut lines: Vec<String> = points
        .iter()
        .map(|point| {
            let label = column(&point.label, label_width, Align::Left);
            format!("{}{}", bar_line(&label, point.value, BAR_GRAPH_WIDTH), warning_icon(point.value))
        })
        .collect();

    // Bars start after two spaces, the label and ": "
    let indent = " ".repeat(label_width + 4);
    let scale = format!("0%{}100%", " ".repeat(BAR_GRAPH_WIDTH - 6));
    lines.push(theme::muted(&format!("{indent}{scale}")).to_string());
    lines
}

fn y_label(row: usize, height: usize) -> &'static str {
    let last = (height - 1) as f64;
    if row == 0 {
        "100%"
    } else if row == (last * 0.25).round() as usize {
        " 75%"
    } else if row == (last * 0.5).round() as usize {
        " 50%"
    } else if row == (last * 0.75).round() as usize {
        " 25%"
    } else if row == height - 1 {
        "  0%"
    } else {
        ""
    }
}

/// One column per point on a grid of [`LINE_GRAPH_HEIGHT`] rows
///
/// Points are `*`, or `!` at or above the warning threshold. A rise between
/// neighbours is drawn with `/` in the earlier column and a fall with `\`
/// in the later one. Rows at or above the threshold carry a `!` axis. A
/// single point is printed as `label: NN%`.
pub fn line_graph(points: &[GraphPoint]) -> Vec<String> {
    let [first, .., last] = points else {
        return points
            .iter()
            .map(|p| format!("{}: {}{}", p.label, percent_label(p.value), warning_icon(p.value)))
            .collect();
    };

    let height = LINE_GRAPH_HEIGHT;
    let mut grid = vec![vec![' '; points.len()]; height];
    let rows: Vec<usize> = points
        .iter()
        .map(|p| ((1.0 - clamp_unit(p.value)) * (height - 1) as f64).round() as usize)
        .collect();

    for (col, (point, &row)) in points.iter().zip(&rows).enumerate() {
        grid[row][col] = if clamp_unit(point.value) >= WARNING_THRESHOLD { '!' } else { '*' };
    }
    for (col, pair) in rows.windows(2).enumerate() {
        let (from, to) = (pair[0], pair[1]);
        if from > to {
            for row in to + 1..from {
                if grid[row][col] == ' ' {
                    grid[row][col] = '/';
                }
            }
        } else {
            for row in from + 1..to {
                if grid[row][col + 1] == ' ' {
                    grid[row][col + 1] = '\\';
                }
            }
        }
    }

    let warning_rows = ((1.0 - WARNING_THRESHOLD) * (height - 1) as f64).floor() as usize;
    let mut lines: Vec<String> = grid
        .into_iter()
        .enumerate()
        .map(|(row, cells)| {
            let axis = if row <= warning_rows { '!' } else { '|' };
            format!(
                "{}{axis}{}",
                column(y_label(row, height), Y_LABEL_WIDTH, Align::Left),
                cells.into_iter().collect::<String>()
            )
        })
        .collect();

    lines.push(format!("{}+{}", " ".repeat(Y_LABEL_WIDTH), "-".repeat(points.len())));
    lines.push(format!(
        "{}{} ~ {}",
        " ".repeat(Y_LABEL_WIDTH + 1),
        first.label,
        last.label
    ));
    lines
}

fn stat_cells(stats: &AggregatedData, bold: bool) -> Vec<Cell> {
    let style = if bold { "br" } else { "r" };
    [
        percent_label(stats.avg_session),
        percent_label(stats.max_session),
        percent_label(stats.avg_weekly),
        format_number(stats.count as u64),
        format_number(stats.total_tokens),
    ]
    .iter()
    .map(|value| Cell::new(value).style_spec(style))
    .collect()
}

fn build_table(report: &SummaryReport, i18n: &I18n, settings: &Settings, include_cost: bool) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    let mut titles = row![
        b -> i18n.t("summary.date"),
        b -> i18n.t("summary.avgSession"),
        b -> i18n.t("summary.maxSession"),
        b -> i18n.t("summary.avgWeekly"),
        b -> i18n.t("summary.records"),
        b -> i18n.t("summary.tokens")
    ];
    if include_cost {
        titles.add_cell(Cell::new(&i18n.t("summary.cost")).style_spec("b"));
    }
    table.set_titles(titles);

    for day in &report.rows {
        let mut cells = vec![Cell::new(&day.date.to_string())];
        cells.extend(stat_cells(&day.stats, false));
        if include_cost {
            cells.push(Cell::new(&format_cost(day.cost_usd, settings)).style_spec("r"));
        }
        table.add_row(Row::new(cells));
    }

    let columns = if include_cost { 7 } else { 6 };
    table.add_row(Row::new(vec![Cell::new(""); columns]));

    let mut totals = vec![Cell::new(&i18n.t("summary.total")).style_spec("b")];
    totals.extend(stat_cells(&report.total.stats, true));
    if include_cost {
        totals.push(Cell::new(&format_cost(report.total.total_cost_usd, settings)).style_spec("br"));
    }
    table.add_row(Row::new(totals));
    table
}

/// Build and print the summary for `period`
pub async fn run_summary(
    reader: &dyn HistoryReader,
    period: SummaryPeriod,
    today: NaiveDate,
    tz: Tz,
    i18n: &I18n,
    settings: &Settings,
    include_cost: bool,
) -> Result<()> {
    let range = period.range(today)?;
    info!(
        "Summarizing {} day(s) from {}",
        (range.end - range.start + Duration::days(1)).num_days(),
        range.start
    );
    let report = build_summary(reader, range, tz).await?;
    print!("{}", format_summary(&report, i18n, settings, include_cost));
    Ok(())
}

/// This week or month against the previous one
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub mode: CompareMode,
    pub comparison: PeriodComparison,
    /// Trend of the highest session utilization, which the viewer omits
    pub max_session: TrendResult,
    /// Days of either period whose file could not be parsed
    pub skipped: usize,
}

impl ComparisonReport {
    pub fn is_empty(&self) -> bool {
        self.comparison.current.stats.count == 0 && self.comparison.previous.stats.count == 0
    }
}

/// Read both periods of `mode` relative to `today`
pub async fn build_comparison(
    reader: &dyn HistoryReader,
    mode: CompareMode,
    today: NaiveDate,
) -> Result<ComparisonReport> {
    let (current, previous) = mode.ranges(today)?;
    info!("Comparing {} with {}", current, previous);
    let (now, before) = futures::try_join!(
        reader.read_history(current.start, current.end),
        reader.read_history(previous.start, previous.end),
    )?;
    for error in now.errors.iter().chain(&before.errors) {
        warn!("Skipping {}: {}", error.date, error.reason);
    }

    let comparison = PeriodComparison::new(
        PeriodStats::from_days(current.start, current.end, &now.data),
        PeriodStats::from_days(previous.start, previous.end, &before.data),
    );
    Ok(ComparisonReport {
        mode,
        max_session: calculate_trend(
            comparison.current.stats.max_session,
            comparison.previous.stats.max_session,
        ),
        comparison,
        skipped: now.errors.len() + before.errors.len(),
    })
}

/// `↑ +12.5%`, `↓ -3.0%`, or `→ -` when the previous value is zero
pub fn trend_cell(trend: &TrendResult) -> String {
    match trend.change_percent {
        None => "→ -".to_string(),
        Some(p) if p == 0.0 => "→ +0.0%".to_string(),
        Some(p) if p > 0.0 => format!("↑ +{p:.1}%"),
        Some(p) => format!("↓ {p:.1}%"),
    }
}

/// Render the comparison as a four-column table
pub fn format_comparison(
    report: &ComparisonReport,
    i18n: &I18n,
    settings: &Settings,
    include_cost: bool,
) -> String {
    let (current_key, previous_key) = report.mode.label_keys();
    let (current_label, previous_label) = (i18n.t(current_key), i18n.t(previous_key));
    let title = i18n.t_with(
        "summary.compareTitle",
        &[("current", &current_label), ("previous", &previous_label)],
    );
    let mut output = format!("{title}\n\n");

    if report.is_empty() {
        output.push_str(&i18n.t("summary.noData"));
        output.push('\n');
        push_skipped(&mut output, report.skipped, i18n);
        return output;
    }

    let (current, previous) = (&report.comparison.current, &report.comparison.previous);
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row![
        b -> i18n.t("compare.metric"),
        b -> previous_label,
        b -> current_label,
        b -> i18n.t("compare.change")
    ]);

    let mut rows = vec![
        (
            "summary.avgSession",
            percent_label(previous.stats.avg_session),
            percent_label(current.stats.avg_session),
            &report.comparison.session,
        ),
        (
            "summary.maxSession",
            percent_label(previous.stats.max_session),
            percent_label(current.stats.max_session),
            &report.max_session,
        ),
        (
            "summary.avgWeekly",
            percent_label(previous.stats.avg_weekly),
            percent_label(current.stats.avg_weekly),
            &report.comparison.weekly,
        ),
        (
            "summary.tokens",
            format_number(previous.stats.total_tokens),
            format_number(current.stats.total_tokens),
            &report.comparison.tokens,
        ),
    ];
    if include_cost {
        rows.push((
            "summary.cost",
            format_cost(previous.total_cost_usd, settings),
            format_cost(current.total_cost_usd, settings),
            &report.comparison.cost,
        ));
    }
    for (key, before, now, trend) in rows {
        table.add_row(Row::new(vec![
            Cell::new(&i18n.t(key)),
            Cell::new(&before).style_spec("r"),
            Cell::new(&now).style_spec("r"),
            Cell::new(&trend_cell(trend)).style_spec("r"),
        ]));
    }
    output.push_str(&table.to_string());

    let empty_side = if current.stats.count == 0 {
        Some(&current_label)
    } else if previous.stats.count == 0 {
        Some(&previous_label)
    } else {
        None
    };
    if let Some(period) = empty_side {
        output.push('\n');
        output.push_str(&i18n.t_with("summary.emptySide", &[("period", period)]));
        output.push('\n');
    }

    push_skipped(&mut output, report.skipped, i18n);
    output
}

/// Build and print the comparison for `mode`
pub async fn run_compare(
    reader: &dyn HistoryReader,
    mode: CompareMode,
    today: NaiveDate,
    i18n: &I18n,
    settings: &Settings,
    include_cost: bool,
) -> Result<()> {
    let report = build_comparison(reader, mode, today).await?;
    print!("{}", format_comparison(&report, i18n, settings, include_cost));
    Ok(())
}
