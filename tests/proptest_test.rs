//! Property-based tests for clusage using proptest

mod common;

use chrono::{Datelike, Duration, NaiveDate};
use clusage::aggregation::{AggregatedData, calculate_stats, calculate_trend, iso_week};
use clusage::periods::{build_calendar_grid, month_days, shift_month, week_range};
use clusage::views::histogram::{CompareBar, summarize};
use clusage_terminal::glyphs::{PROGRESS_FULL, progress_bar};
use clusage_terminal::text::{self, Align, clamp_unit, visible_width};
use common::UsageRecordBuilder;
use proptest::prelude::*;
use std::collections::HashSet;

// Strategies for generating test data

prop_compose! {
    fn arb_date()(days in 0i64..20_000) -> NaiveDate {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(days)
    }
}

prop_compose! {
    fn arb_year_month()(year in 1970i32..2100, month in 1u32..=12) -> (i32, u32) {
        (year, month)
    }
}

prop_compose! {
    fn arb_bucket()(
        avg_session in 0.0f64..1.0,
        avg_weekly in 0.0f64..1.0,
        total_tokens in 0u64..10_000_000,
        count in 0usize..500,
    ) -> AggregatedData {
        AggregatedData {
            avg_session,
            max_session: avg_session,
            avg_weekly,
            max_weekly: avg_weekly,
            total_tokens,
            count,
        }
    }
}

prop_compose! {
    fn arb_compare_bar()(
        current in 0.0f64..1.0,
        previous in 0.0f64..1.0,
        current_count in 0usize..50,
        previous_count in 0usize..50,
    ) -> CompareBar {
        CompareBar {
            label: "x".to_string(),
            current,
            previous,
            current_count,
            previous_count,
        }
    }
}

proptest! {
    #[test]
    fn test_clamp_stays_in_unit_range(v in prop::num::f64::ANY) {
        let c = clamp_unit(v);
        prop_assert!((0.0..=1.0).contains(&c));
    }

    #[test]
    fn test_progress_bar_fill(v in -2.0f64..3.0, width in 0usize..60) {
        let bar = progress_bar(v, width);
        prop_assert_eq!(visible_width(&bar), width);
        let filled = bar.matches(PROGRESS_FULL).count();
        prop_assert_eq!(filled, (clamp_unit(v) * width as f64).round() as usize);
    }

    #[test]
    fn test_calendar_grid_shape((year, month) in arb_year_month()) {
        let grid = build_calendar_grid(year, month).unwrap();
        prop_assert_eq!(grid.len(), 6);
        prop_assert!(grid.iter().all(|row| row.len() == 7));

        let days: Vec<u32> = grid.iter().flatten().flatten().copied().collect();
        prop_assert_eq!(days.len() as u32, month_days(year, month).unwrap());
        let unique: HashSet<_> = days.iter().collect();
        prop_assert_eq!(unique.len(), days.len());
        // Day numbers run in order across rows
        prop_assert!(days.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn test_iso_week_matches_chrono(date in arb_date()) {
        let ours = iso_week(date);
        let reference = date.iso_week();
        prop_assert_eq!(ours.year, reference.year());
        prop_assert_eq!(ours.week, reference.week());
    }

    #[test]
    fn test_week_range_is_monday_to_sunday(date in arb_date(), offset in -60i64..60) {
        let range = week_range(date, offset);
        prop_assert_eq!(range.start.weekday(), chrono::Weekday::Mon);
        prop_assert_eq!((range.end - range.start).num_days(), 6);
        prop_assert!(week_range(date, 0).contains(date));
    }

    #[test]
    fn test_shift_month_round_trip((year, month) in arb_year_month(), delta in -240i32..240) {
        let (y, m) = shift_month(year, month, delta);
        prop_assert!((1..=12).contains(&m));
        prop_assert_eq!(shift_month(y, m, -delta), (year, month));
    }

    #[test]
    fn test_merge_weights_by_count(a in arb_bucket(), b in arb_bucket()) {
        let merged = a.merge(&b);
        prop_assert_eq!(merged.count, a.count + b.count);
        prop_assert_eq!(merged.total_tokens, a.total_tokens + b.total_tokens);
        if merged.count > 0 {
            let expected = (a.avg_session * a.count as f64 + b.avg_session * b.count as f64)
                / merged.count as f64;
            prop_assert!((merged.avg_session - expected).abs() < 1e-9);
            prop_assert!(merged.avg_session <= a.avg_session.max(b.avg_session) + 1e-9);
        } else {
            prop_assert_eq!(merged.avg_session, 0.0);
        }
    }

    #[test]
    fn test_stats_of_records(sessions in prop::collection::vec(0.0f64..1.0, 0..40)) {
        let records: Vec<_> = sessions
            .iter()
            .map(|s| UsageRecordBuilder::new().with_session(*s).build())
            .collect();
        let stats = calculate_stats(&records);
        prop_assert_eq!(stats.count, sessions.len());
        if sessions.is_empty() {
            prop_assert_eq!(stats, AggregatedData::default());
        } else {
            let max = sessions.iter().cloned().fold(0.0, f64::max);
            prop_assert_eq!(stats.max_session, max);
            prop_assert!(stats.avg_session <= max + 1e-12);
        }
    }

    #[test]
    fn test_trend_is_undefined_only_without_baseline(current in 0.0f64..1e6, previous in 0.0f64..1e6) {
        let trend = calculate_trend(current, previous);
        match trend.change_percent {
            None => prop_assert_eq!(previous, 0.0),
            Some(p) => {
                prop_assert!(p.is_finite());
                prop_assert_eq!(p >= 0.0, current >= previous);
            }
        }
    }

    #[test]
    fn test_compare_summary_extremes(bars in prop::collection::vec(arb_compare_bar(), 0..12)) {
        let summary = summarize(&bars);
        if let Some(up) = &summary.max_increase {
            prop_assert!(up.change_percent > 0.0);
            prop_assert!(bars.iter().filter(|b| b.current > b.previous).all(|b| b.change_percent() <= up.change_percent));
        } else {
            prop_assert!(bars.iter().all(|b| b.current <= b.previous));
        }
        if let Some(down) = &summary.max_decrease {
            prop_assert!(down.change_percent < 0.0);
        } else {
            prop_assert!(bars.iter().all(|b| b.current >= b.previous));
        }
    }

    #[test]
    fn test_pad_reaches_width(s in "[a-z가-힣]{0,8}", width in 0usize..24) {
        for align in [Align::Left, Align::Center, Align::Right] {
            let padded = text::pad(&s, width, align);
            prop_assert_eq!(visible_width(&padded), width.max(visible_width(&s)));
        }
    }
}

#[test]
fn test_iso_week_year_boundaries() {
    let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
    // 2024-12-30 is a Monday whose Thursday is 2025-01-02
    let week = iso_week(d(2024, 12, 30));
    assert_eq!((week.year, week.week), (2025, 1));
    // 2021-01-03 is a Sunday still in 2020's week 53
    let week = iso_week(d(2021, 1, 3));
    assert_eq!((week.year, week.week), (2020, 53));
    let week = iso_week(d(2026, 1, 1));
    assert_eq!((week.year, week.week), (2026, 1));
}

#[test]
fn test_trend_reference_values() {
    assert_eq!(calculate_trend(0.0, 0.0).change_percent, None);
    assert_eq!(calculate_trend(150.0, 100.0).change_percent, Some(50.0));
}
