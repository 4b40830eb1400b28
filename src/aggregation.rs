//! Aggregation module for summarizing usage records
//!
//! This module groups usage records into hour, day, week and month buckets
//! and reduces each bucket to an [`AggregatedData`] summary. The views build
//! everything they display on top of these functions: the calendar info
//! panel, the hourly detail list, the period comparison table and every
//! histogram bar.
//!
//! # Weighting
//!
//! When several buckets are folded into one figure the record count is the
//! weight. Two days with averages of 20% over 10 records and 80% over 30
//! records merge to 65%, not 50%. [`AggregatedData::merge`] is the only
//! place that combines summaries.
//!
//! # Examples
//!
//! ```
//! use clusage::aggregation::{calculate_stats, calculate_trend};
//! use clusage_core::UsageRecord;
//! use chrono::DateTime;
//!
//! let ts = DateTime::parse_from_rfc3339("2026-03-02T10:15:00+09:00").unwrap();
//! let records = vec![UsageRecord::new(ts, 0.2, 0.4), UsageRecord::new(ts, 0.6, 0.5)];
//!
//! let stats = calculate_stats(&records);
//! assert_eq!(stats.count, 2);
//! assert!((stats.avg_session - 0.4).abs() < 1e-9);
//!
//! let trend = calculate_trend(150.0, 100.0);
//! assert_eq!(trend.change_percent, Some(50.0));
//! ```

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Timelike};
use chrono_tz::Tz;
use clusage_core::{DailyUsageFile, UsageRecord};
use clusage_pricing::{CostCalculator, CostOptions};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Bucket size for [`group_by_unit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Hour,
    Day,
    Week,
    Month,
}

/// An ISO-8601 week number together with its week-numbering year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IsoWeek {
    pub year: i32,
    pub week: u32,
}

impl IsoWeek {
    /// Short label used on chart axes, e.g. `W05`
    pub fn label(&self) -> String {
        format!("W{:02}", self.week)
    }
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// The Thursday of the Monday-based week containing `date`
fn thursday_of_week(date: NaiveDate) -> NaiveDate {
    let days_since_monday = i64::from(date.weekday().num_days_from_monday());
    date - Duration::days(days_since_monday) + Duration::days(3)
}

/// ISO week of `date`
///
/// The week belongs to the year of its Thursday; week 1 is the week that
/// contains January 4th.
pub fn iso_week(date: NaiveDate) -> IsoWeek {
    let thursday = thursday_of_week(date);
    let year = thursday.year();
    // January 4th always exists
    let jan4 = NaiveDate::from_ymd_opt(year, 1, 4).unwrap_or(thursday);
    let first_thursday = thursday_of_week(jan4);
    let days = (thursday - first_thursday).num_days();
    IsoWeek {
        year,
        week: u32::try_from(days / 7 + 1).unwrap_or(1),
    }
}

/// Bucket key of one timestamp
///
/// Hour and month keys use the local time in `tz`; the day key is the date
/// portion of the timestamp as recorded.
pub fn group_key(timestamp: &DateTime<FixedOffset>, unit: TimeUnit, tz: Tz) -> String {
    let local = timestamp.with_timezone(&tz);
    match unit {
        TimeUnit::Hour => format!("{} {:02}:00", local.format("%Y-%m-%d"), local.hour()),
        TimeUnit::Day => timestamp.date_naive().format("%Y-%m-%d").to_string(),
        TimeUnit::Week => iso_week(local.date_naive()).to_string(),
        TimeUnit::Month => local.format("%Y-%m").to_string(),
    }
}

/// Group records by bucket key; order within a bucket is preserved
pub fn group_by_unit(
    records: &[UsageRecord],
    unit: TimeUnit,
    tz: Tz,
) -> HashMap<String, Vec<&UsageRecord>> {
    let mut groups: HashMap<String, Vec<&UsageRecord>> = HashMap::new();
    for record in records {
        groups
            .entry(group_key(&record.timestamp, unit, tz))
            .or_default()
            .push(record);
    }
    groups
}

/// Summary statistics over a set of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedData {
    pub avg_session: f64,
    pub max_session: f64,
    pub avg_weekly: f64,
    pub max_weekly: f64,
    /// Input plus output tokens
    pub total_tokens: u64,
    pub count: usize,
}

impl AggregatedData {
    /// Combine two summaries, weighting the averages by record count
    pub fn merge(&self, other: &AggregatedData) -> AggregatedData {
        let count = self.count + other.count;
        if count == 0 {
            return AggregatedData {
                total_tokens: self.total_tokens + other.total_tokens,
                ..AggregatedData::default()
            };
        }
        let weighted = |a: f64, b: f64| {
            (a * self.count as f64 + b * other.count as f64) / count as f64
        };
        AggregatedData {
            avg_session: weighted(self.avg_session, other.avg_session),
            max_session: self.max_session.max(other.max_session),
            avg_weekly: weighted(self.avg_weekly, other.avg_weekly),
            max_weekly: self.max_weekly.max(other.max_weekly),
            total_tokens: self.total_tokens + other.total_tokens,
            count,
        }
    }

    /// Fold any number of summaries with [`AggregatedData::merge`]
    pub fn merge_all<'a>(items: impl IntoIterator<Item = &'a AggregatedData>) -> AggregatedData {
        items
            .into_iter()
            .fold(AggregatedData::default(), |acc, item| acc.merge(item))
    }
}

/// Averages and maxima of session and weekly utilization
///
/// Empty input yields all zeros with `count == 0`.
pub fn calculate_stats<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> AggregatedData {
    let mut stats = AggregatedData::default();
    let mut sum_session = 0.0;
    let mut sum_weekly = 0.0;

    for record in records {
        sum_session += record.session.utilization;
        sum_weekly += record.weekly.utilization;
        stats.max_session = stats.max_session.max(record.session.utilization);
        stats.max_weekly = stats.max_weekly.max(record.weekly.utilization);
        if let Some(tokens) = &record.tokens {
            stats.total_tokens += tokens.total_io();
        }
        stats.count += 1;
    }

    if stats.count > 0 {
        stats.avg_session = sum_session / stats.count as f64;
        stats.avg_weekly = sum_weekly / stats.count as f64;
    }
    stats
}

/// Change between two values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// `None` when the previous value is zero
    pub change_percent: Option<f64>,
    pub previous_value: f64,
    pub current_value: f64,
}

/// Percentage change from `previous` to `current`
pub fn calculate_trend(current: f64, previous: f64) -> TrendResult {
    let change_percent = if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous * 100.0)
    };
    TrendResult {
        change_percent,
        previous_value: previous,
        current_value: current,
    }
}

/// Trends of the three utilization metrics between two summaries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricTrends {
    pub session: TrendResult,
    pub weekly: TrendResult,
    pub tokens: TrendResult,
}

pub fn compare_periods(current: &AggregatedData, previous: &AggregatedData) -> MetricTrends {
    MetricTrends {
        session: calculate_trend(current.avg_session, previous.avg_session),
        weekly: calculate_trend(current.avg_weekly, previous.avg_weekly),
        tokens: calculate_trend(current.total_tokens as f64, previous.total_tokens as f64),
    }
}

/// All records of a set of daily files, in file order
pub fn flatten_records(data: &[DailyUsageFile]) -> Vec<UsageRecord> {
    data.iter()
        .flat_map(|day| day.records.iter().cloned())
        .collect()
}

/// Summary per bucket key over every record in `data`
pub fn aggregate_usage(
    data: &[DailyUsageFile],
    unit: TimeUnit,
    tz: Tz,
) -> BTreeMap<String, AggregatedData> {
    let records = flatten_records(data);
    group_by_unit(&records, unit, tz)
        .into_iter()
        .map(|(key, group)| (key, calculate_stats(group)))
        .collect()
}

/// One hour-of-day bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyData {
    pub hour: u32,
    pub avg_session: f64,
    pub avg_weekly: f64,
    pub max_session: f64,
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub count: usize,
}

fn local_hour(record: &UsageRecord, tz: Tz) -> u32 {
    record.timestamp.with_timezone(&tz).hour()
}

fn hourly_groups(records: &[UsageRecord], tz: Tz) -> BTreeMap<u32, Vec<&UsageRecord>> {
    let mut groups: BTreeMap<u32, Vec<&UsageRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(local_hour(record, tz)).or_default().push(record);
    }
    groups
}

fn io_tokens<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> (u64, u64) {
    records
        .into_iter()
        .filter_map(|r| r.tokens.as_ref())
        .fold((0, 0), |(input, output), t| (input + t.input, output + t.output))
}

/// Hour-of-day buckets of one day's records, ascending by hour
pub fn aggregate_hourly(records: &[UsageRecord], tz: Tz) -> Vec<HourlyData> {
    hourly_groups(records, tz)
        .into_iter()
        .map(|(hour, group)| {
            let stats = calculate_stats(group.iter().copied());
            let (input_tokens, output_tokens) = io_tokens(group.iter().copied());
            HourlyData {
                hour,
                avg_session: stats.avg_session,
                avg_weekly: stats.avg_weekly,
                max_session: stats.max_session,
                total_tokens: stats.total_tokens,
                input_tokens,
                output_tokens,
                count: stats.count,
            }
        })
        .collect()
}

/// Summary block of the detail view
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub avg_session: f64,
    pub max_session: f64,
    /// Hour in which the maximum session utilization was recorded
    pub max_session_hour: Option<u32>,
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub estimated_cost_usd: f64,
    pub count: usize,
}

/// Daily summary; the earliest hour wins a tie for the maximum
pub fn calculate_daily_summary(records: &[UsageRecord], tz: Tz) -> DailySummary {
    if records.is_empty() {
        return DailySummary::default();
    }
    let stats = calculate_stats(records);
    let (input_tokens, output_tokens) = io_tokens(records);

    let mut max_session = 0.0;
    let mut max_session_hour = None;
    for hour in aggregate_hourly(records, tz) {
        if hour.max_session > max_session {
            max_session = hour.max_session;
            max_session_hour = Some(hour.hour);
        }
    }

    DailySummary {
        avg_session: stats.avg_session,
        max_session,
        max_session_hour,
        total_tokens: stats.total_tokens,
        input_tokens,
        output_tokens,
        estimated_cost_usd: CostCalculator::calculate_total_cost(records, CostOptions::default())
            .total_cost_usd,
        count: stats.count,
    }
}

/// Statistics and cost of a closed date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub stats: AggregatedData,
    pub total_cost_usd: f64,
}

impl PeriodStats {
    pub fn from_days(start: NaiveDate, end: NaiveDate, data: &[DailyUsageFile]) -> Self {
        let records = flatten_records(data);
        Self {
            start,
            end,
            stats: calculate_stats(&records),
            total_cost_usd: CostCalculator::calculate_total_cost(&records, CostOptions::default())
                .total_cost_usd,
        }
    }
}

/// One ISO week of the weekly histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyData {
    pub week: IsoWeek,
    pub period: PeriodStats,
}

impl WeeklyData {
    pub fn label(&self) -> String {
        self.week.label()
    }
}

/// One calendar month of the monthly histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyData {
    pub year: i32,
    pub month: u32,
    pub period: PeriodStats,
}

/// Two periods side by side with the trend of each displayed metric
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodComparison {
    pub current: PeriodStats,
    pub previous: PeriodStats,
    pub session: TrendResult,
    pub weekly: TrendResult,
    pub tokens: TrendResult,
    pub cost: TrendResult,
}

impl PeriodComparison {
    pub fn new(current: PeriodStats, previous: PeriodStats) -> Self {
        let trends = compare_periods(&current.stats, &previous.stats);
        let cost = calculate_trend(current.total_cost_usd, previous.total_cost_usd);
        Self {
            current,
            previous,
            session: trends.session,
            weekly: trends.weekly,
            tokens: trends.tokens,
            cost,
        }
    }
}

/// Per-weekday summaries, Monday first
///
/// Several files for the same weekday are merged by record count.
pub fn aggregate_by_weekday(data: &[DailyUsageFile]) -> [Option<AggregatedData>; 7] {
    let mut days: [Option<AggregatedData>; 7] = [None; 7];
    for file in data {
        let index = file.date.weekday().num_days_from_monday() as usize;
        let stats = calculate_stats(&file.records);
        days[index] = Some(match days[index] {
            Some(existing) => existing.merge(&stats),
            None => stats,
        });
    }
    days
}
