//! End-to-end tests driving the views through a headless terminal shell

mod common;

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use clusage::viewer::initial_calendar;
use clusage::views::{CalendarView, DetailView, ViewerServices};
use clusage_core::{Clock, I18n, Locale, MemoryHistoryReader, Settings};
use clusage_history::DailyFileReader;
use clusage_terminal::text::strip_styles;
use clusage_terminal::{AppOptions, Component, LoadWaker, Size, TerminalApp};
use common::{TestDataDir, UsageRecordBuilder, date, day_of_records};
use std::sync::Arc;
use std::time::Duration;

fn clock() -> Clock {
    Clock::fixed(Tz::UTC, Utc.with_ymd_and_hms(2026, 10, 18, 15, 30, 0).unwrap())
}

fn services(reader: MemoryHistoryReader, waker: &LoadWaker) -> ViewerServices {
    ViewerServices::new(
        Arc::new(reader),
        I18n::new(Locale::En),
        Settings::default(),
        clock(),
        waker.clone(),
    )
}

fn headless(waker: &LoadWaker) -> TerminalApp<Vec<u8>> {
    let options = AppOptions {
        use_alt_screen: false,
        raw_input: false,
    };
    let mut app = TerminalApp::new(Vec::new(), Size::new(100, 40), options, waker.clone());
    app.start().unwrap();
    app
}

fn frame(app: &TerminalApp<Vec<u8>>) -> Vec<String> {
    app.screen()
        .frame()
        .iter()
        .map(|line| strip_styles(line).into_owned())
        .collect()
}

fn frame_contains(app: &TerminalApp<Vec<u8>>, needle: &str) -> bool {
    frame(app).iter().any(|line| line.contains(needle))
}

/// Wait for background loads and let the shell collect them
async fn settle(app: &mut TerminalApp<Vec<u8>>, waker: &LoadWaker, done: impl Fn(&TerminalApp<Vec<u8>>) -> bool) {
    for _ in 0..50 {
        app.poll_updates().unwrap();
        if done(app) {
            return;
        }
        let _ = tokio::time::timeout(Duration::from_millis(100), waker.notified()).await;
    }
    panic!("shell never reached the expected state");
}

#[tokio::test]
async fn test_calendar_detail_round_trip() {
    let waker = LoadWaker::new();
    let reader = MemoryHistoryReader::new().with_records(day_of_records(2026, 10, 18, [9, 12, 15]));
    let calendar = initial_calendar(services(reader, &waker)).await.unwrap();

    let mut app = headless(&waker);
    app.push(Box::new(calendar)).unwrap();
    assert_eq!(app.stack_len(), 1);
    assert!(frame_contains(&app, "October 2026"));
    assert!(frame_contains(&app, "[Day 18]"));
    assert!(frame_contains(&app, "3 records"));

    app.handle_input(b"\r").unwrap();
    assert_eq!(app.stack_len(), 2);
    assert!(frame(&app)[0].contains("2026-10-18 Details"));
    assert!(frame_contains(&app, "15:00"));
    assert!(app.screen().footer().contains("ESC/q Back"));

    app.handle_input(b"\x1b").unwrap();
    assert_eq!(app.stack_len(), 1);
    assert!(frame_contains(&app, "October 2026"));
    assert!(app.screen().footer().contains("Histogram"));

    app.handle_input(b"q").unwrap();
    assert!(app.exit_requested());
    app.cleanup();
    assert_eq!(app.stack_len(), 0);
}

#[tokio::test]
async fn test_month_paging_loads_in_background() {
    let waker = LoadWaker::new();
    let reader = MemoryHistoryReader::new()
        .with_records([UsageRecordBuilder::new().at(2026, 9, 2, 10).with_session(0.7).build()]);
    let calendar = initial_calendar(services(reader, &waker)).await.unwrap();

    let mut app = headless(&waker);
    app.push(Box::new(calendar)).unwrap();
    app.handle_input(b"[").unwrap();
    assert!(frame_contains(&app, "September 2026"));

    settle(&mut app, &waker, |app| !frame_contains(app, "Loading...")).await;
    // Paging re-anchors on the 1st, which has no records
    assert!(frame_contains(&app, "[Day 1]"));
    assert!(frame_contains(&app, "No data"));

    app.handle_input(b"\x1b[C").unwrap();
    assert!(frame_contains(&app, "[Day 2]"));
    assert!(frame_contains(&app, "1 records"));
}

#[tokio::test]
async fn test_compare_and_histogram_screens() {
    let waker = LoadWaker::new();
    let reader = MemoryHistoryReader::new()
        .with_records(day_of_records(2026, 10, 13, [10]))
        .with_records(day_of_records(2026, 10, 18, [12]));
    let calendar = initial_calendar(services(reader, &waker)).await.unwrap();

    let mut app = headless(&waker);
    app.push(Box::new(calendar)).unwrap();

    app.handle_input(b"c").unwrap();
    assert_eq!(app.stack_len(), 2);
    settle(&mut app, &waker, |app| frame_contains(app, "[This week] vs [Last week]")).await;
    app.handle_input(b"\x1b").unwrap();
    assert_eq!(app.stack_len(), 1);

    app.handle_input(b"\t").unwrap();
    assert_eq!(app.stack_len(), 2);
    settle(&mut app, &waker, |app| frame_contains(app, "12:00 hour")).await;
    assert!(frame_contains(&app, "[Tab Back]"));

    // Tab on the histogram goes back to the calendar
    app.handle_input(b"\t").unwrap();
    assert_eq!(app.stack_len(), 1);
    app.cleanup();
}

#[tokio::test]
async fn test_viewer_over_daily_files() {
    let data = TestDataDir::new();
    data.write_day(date(2026, 10, 17), day_of_records(2026, 10, 17, [8, 20]));
    data.write_raw(date(2026, 10, 16), r#"{"date": "2026-10-16", "records": 3}"#);

    let waker = LoadWaker::new();
    let services = ViewerServices::new(
        Arc::new(DailyFileReader::new(data.path())),
        I18n::new(Locale::En),
        Settings::default(),
        clock(),
        waker.clone(),
    );
    let mut calendar = CalendarView::new(services.clone()).unwrap();
    calendar.load_current_month().await;

    // The broken file is skipped, the readable one is shown
    assert!(calendar.error().is_none());
    assert!(calendar.has_data(date(2026, 10, 17)));
    assert!(!calendar.has_data(date(2026, 10, 16)));
    assert_eq!(calendar.skipped_days(), [date(2026, 10, 16)]);
    let lines: Vec<String> = calendar.render().iter().map(|l| strip_styles(l).into_owned()).collect();
    assert!(lines.iter().any(|l| l == "⚠ 1 file(s) could not be read: 2026-10-16"));

    let day = calendar.day_data(date(2026, 10, 17)).cloned().unwrap();
    let detail = DetailView::new(day, services);
    assert_eq!(detail.hours().len(), 2);
    assert_eq!(detail.summary().max_session_hour, Some(20));
}
