//! Calendar and period arithmetic
//!
//! Month grids for the calendar view and the date ranges the comparison
//! and histogram views read. Every function takes "today" explicitly so the
//! views can pin it through their [`Clock`](clusage_core::Clock).

use chrono::{Datelike, Duration, NaiveDate};
use clusage_core::{ClusageError, I18n, Locale, Result};
use std::fmt;

/// Number of rows in a month grid
pub const CALENDAR_ROWS: usize = 6;
/// Days per grid row, Sunday first
pub const CALENDAR_COLS: usize = 7;

/// A closed date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single day
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.start, self.end)
    }
}

fn check_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(ClusageError::InvalidMonth(month))
    }
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    check_month(month)?;
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ClusageError::InvalidDate(format!("{year}-{month:02}-01")))
}

/// Days in `month` of `year` (28 to 31)
pub fn month_days(year: i32, month: u32) -> Result<u32> {
    let first = first_of_month(year, month)?;
    let (next_year, next_month) = shift_month(year, month, 1);
    let next = first_of_month(next_year, next_month)?;
    Ok(u32::try_from((next - first).num_days()).unwrap_or(30))
}

/// Weekday of the 1st, 0 for Sunday through 6 for Saturday
pub fn first_weekday(year: i32, month: u32) -> Result<u32> {
    Ok(first_of_month(year, month)?.weekday().num_days_from_sunday())
}

/// `(year, month)` moved by `delta` months, wrapping the year
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Six rows of seven days, Sunday first; cells outside the month are `None`
pub fn build_calendar_grid(year: i32, month: u32) -> Result<Vec<Vec<Option<u32>>>> {
    let offset = first_weekday(year, month)? as usize;
    let days = month_days(year, month)? as usize;

    let grid = (0..CALENDAR_ROWS)
        .map(|row| {
            (0..CALENDAR_COLS)
                .map(|col| {
                    let index = row * CALENDAR_COLS + col;
                    (index >= offset && index - offset < days).then(|| (index - offset + 1) as u32)
                })
                .collect()
        })
        .collect();
    Ok(grid)
}

/// The whole of `month`
pub fn month_range(year: i32, month: u32) -> Result<DateRange> {
    let start = first_of_month(year, month)?;
    let days = month_days(year, month)?;
    Ok(DateRange::new(start, start + Duration::days(i64::from(days) - 1)))
}

/// Monday-to-Sunday week `offset` weeks from the one containing `today`
pub fn week_range(today: NaiveDate, offset: i64) -> DateRange {
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
        + Duration::weeks(offset);
    DateRange::new(monday, monday + Duration::days(6))
}

/// The whole month `offset` months from the one containing `today`
pub fn month_offset_range(today: NaiveDate, offset: i32) -> Result<DateRange> {
    let (year, month) = shift_month(today.year(), today.month(), offset);
    month_range(year, month)
}

/// Month-to-date ranges for this month and the previous one
///
/// The current range runs from the 1st to `today`; the previous range
/// covers the same days of the prior month, cut short at its last day.
pub fn month_to_date_ranges(today: NaiveDate) -> Result<(DateRange, DateRange)> {
    let current = DateRange::new(first_of_month(today.year(), today.month())?, today);
    let (year, month) = shift_month(today.year(), today.month(), -1);
    let previous_start = first_of_month(year, month)?;
    let last_day = today.day().min(month_days(year, month)?);
    let previous = DateRange::new(
        previous_start,
        previous_start + Duration::days(i64::from(last_day) - 1),
    );
    Ok((current, previous))
}

/// Every date of a range, in order
pub fn dates_in(range: DateRange) -> impl Iterator<Item = NaiveDate> {
    range.start.iter_days().take_while(move |d| *d <= range.end)
}

/// `2026년 10월` or `October 2026`
pub fn format_month_year(year: i32, month: u32, i18n: &I18n) -> String {
    let names = i18n.list("calendar.monthNames");
    let name = names
        .get(month.saturating_sub(1) as usize)
        .cloned()
        .unwrap_or_else(|| month.to_string());
    let month_label = match i18n.locale() {
        Locale::Ko => month.to_string(),
        Locale::En => name,
    };
    i18n.t_with(
        "calendar.monthYear",
        &[("year", &year), ("month", &month_label)],
    )
}

/// Sunday-first weekday abbreviations
pub fn weekday_headers(i18n: &I18n) -> Vec<String> {
    i18n.list("calendar.weekdays")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_days() {
        assert_eq!(month_days(2026, 2).unwrap(), 28);
        assert_eq!(month_days(2028, 2).unwrap(), 29);
        assert_eq!(month_days(2026, 12).unwrap(), 31);
        assert_eq!(month_days(2026, 4).unwrap(), 30);
    }

    #[test]
    fn test_invalid_month_is_an_error() {
        assert!(matches!(month_days(2026, 13), Err(ClusageError::InvalidMonth(13))));
        assert!(matches!(build_calendar_grid(2026, 0), Err(ClusageError::InvalidMonth(0))));
    }

    #[test]
    fn test_shift_month_wraps() {
        assert_eq!(shift_month(2026, 1, -1), (2025, 12));
        assert_eq!(shift_month(2026, 12, 1), (2027, 1));
        assert_eq!(shift_month(2026, 3, -15), (2024, 12));
        assert_eq!(shift_month(2026, 3, 0), (2026, 3));
    }

    #[test]
    fn test_grid_layout() {
        // October 2026 starts on a Thursday
        let grid = build_calendar_grid(2026, 10).unwrap();
        assert_eq!(grid[0], vec![None, None, None, None, Some(1), Some(2), Some(3)]);
        assert_eq!(grid[4][6], Some(31));
        assert!(grid[5].iter().all(Option::is_none));
    }

    #[test]
    fn test_week_range_is_monday_based() {
        // Sunday 2026-10-18
        let range = week_range(date(2026, 10, 18), 0);
        assert_eq!(range, DateRange::new(date(2026, 10, 12), date(2026, 10, 18)));
        let last = week_range(date(2026, 10, 18), -1);
        assert_eq!(last.start, date(2026, 10, 5));
    }

    #[test]
    fn test_month_offset_range_crosses_year() {
        let range = month_offset_range(date(2026, 1, 20), -1).unwrap();
        assert_eq!(range, DateRange::new(date(2025, 12, 1), date(2025, 12, 31)));
    }

    #[test]
    fn test_month_to_date_caps_previous_month() {
        let (current, previous) = month_to_date_ranges(date(2026, 3, 31)).unwrap();
        assert_eq!(current, DateRange::new(date(2026, 3, 1), date(2026, 3, 31)));
        assert_eq!(previous, DateRange::new(date(2026, 2, 1), date(2026, 2, 28)));

        let (_, previous) = month_to_date_ranges(date(2026, 3, 10)).unwrap();
        assert_eq!(previous.end, date(2026, 2, 10));
    }

    #[test]
    fn test_dates_in_range() {
        let days: Vec<_> = dates_in(DateRange::new(date(2026, 2, 27), date(2026, 3, 2))).collect();
        assert_eq!(days.len(), 4);
        assert_eq!(dates_in(DateRange::new(date(2026, 3, 2), date(2026, 3, 1))).count(), 0);
    }

    #[test]
    fn test_month_year_labels() {
        assert_eq!(format_month_year(2026, 10, &I18n::new(Locale::Ko)), "2026년 10월");
        assert_eq!(format_month_year(2026, 10, &I18n::new(Locale::En)), "October 2026");
    }

    proptest! {
        #[test]
        fn prop_grid_holds_each_day_once(year in 1970i32..2100, month in 1u32..=12) {
            let grid = build_calendar_grid(year, month).unwrap();
            prop_assert_eq!(grid.len(), CALENDAR_ROWS);
            prop_assert!(grid.iter().all(|row| row.len() == CALENDAR_COLS));

            let days: Vec<u32> = grid.iter().flatten().flatten().copied().collect();
            let expected: Vec<u32> = (1..=month_days(year, month).unwrap()).collect();
            prop_assert_eq!(days, expected);
        }
    }
}
