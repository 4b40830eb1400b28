//! Hour-by-hour breakdown of one day

use chrono::{NaiveDate, Timelike};
use clusage_core::DailyUsageFile;
use clusage_terminal::component::DEFAULT_VISIBLE_COUNT;
use clusage_terminal::input::format_key_help;
use clusage_terminal::text::{self, Align};
use clusage_terminal::{
    AppContext, Component, ComponentBase, KeyEvent, KeyName, SelectableList, glyphs, theme,
};

use super::ViewerServices;
use crate::aggregation::{DailySummary, HourlyData, aggregate_hourly, calculate_daily_summary};
use crate::format::{format_cost, header_line};

const HEADER_WIDTH: usize = 50;
const SEPARATOR_WIDTH: usize = 45;
const HOUR_BAR_WIDTH: usize = 8;

/// Scrollable hourly list plus a summary block for a single date
pub struct DetailView {
    base: ComponentBase,
    list: SelectableList<HourlyData>,
    date: NaiveDate,
    summary: DailySummary,
    /// Hour to highlight, set only when the date is today
    current_hour: Option<u32>,
    services: ViewerServices,
}

impl DetailView {
    pub fn new(day: DailyUsageFile, services: ViewerServices) -> Self {
        let tz = services.clock.tz();
        let now = services.clock.now();
        let current_hour = (day.date == now.date_naive()).then(|| now.hour());

        let base = ComponentBase::new();
        let mut list = SelectableList::new(DEFAULT_VISIBLE_COUNT);
        list.set_items(aggregate_hourly(&day.records, tz));
        base.adopt(list.base());

        Self {
            base,
            list,
            date: day.date,
            summary: calculate_daily_summary(&day.records, tz),
            current_hour,
            services,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn summary(&self) -> &DailySummary {
        &self.summary
    }

    pub fn hours(&self) -> &[HourlyData] {
        self.list.items()
    }

    pub fn selected_index(&self) -> usize {
        self.list.selected_index()
    }

    fn render_hour(&self, item: &HourlyData, selected: bool) -> String {
        let i18n = &self.services.i18n;
        let percent = text::pad(&format!("{}%", text::percent(item.avg_session)), 4, Align::Right);
        let suffix = if self.current_hour == Some(item.hour) {
            theme::positive(&format!(" ← {}", i18n.t("detail.currentHour"))).to_string()
        } else {
            String::new()
        };
        let line = format!(
            "{:02}:00 {} {percent}{suffix}",
            item.hour,
            glyphs::progress_bar(item.avg_session, HOUR_BAR_WIDTH)
        );
        if selected {
            theme::selected(&line).to_string()
        } else {
            line
        }
    }

    fn render_summary(&self, lines: &mut Vec<String>) {
        let i18n = &self.services.i18n;
        let summary = &self.summary;
        let rule = theme::muted(&glyphs::rule(SEPARATOR_WIDTH)).to_string();

        lines.push(String::new());
        lines.push(rule.clone());
        lines.push(theme::heading(&i18n.t("detail.summary")).to_string());
        lines.push(rule);

        lines.push(format!(
            "{}: {}%",
            i18n.t("detail.avgUsage"),
            text::percent(summary.avg_session)
        ));
        let at_hour = summary
            .max_session_hour
            .map(|hour| i18n.t_with("detail.atHour", &[("hour", &hour)]))
            .unwrap_or_default();
        lines.push(format!(
            "{}: {}% {}",
            i18n.t("detail.maxUsage"),
            text::percent(summary.max_session),
            at_hour
        ));
        lines.push(format!(
            "{}: {} ({}: {} / {}: {})",
            i18n.t("detail.totalTokens"),
            text::format_number(summary.total_tokens),
            i18n.t("detail.inputTokens"),
            text::format_number(summary.input_tokens),
            i18n.t("detail.outputTokens"),
            text::format_number(summary.output_tokens),
        ));
        lines.push(format!(
            "{}: {}",
            i18n.t("detail.estimatedCost"),
            format_cost(summary.estimated_cost_usd, &self.services.settings)
        ));
    }
}

impl Component for DetailView {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn render(&self) -> Vec<String> {
        let i18n = &self.services.i18n;
        let title = i18n.t_with("detail.title", &[("date", &self.date)]);
        let hint = format!("[ESC {}]", i18n.t("detail.keyBack"));
        let mut lines = vec![header_line(&title, &hint, HEADER_WIDTH), String::new()];

        if self.list.is_empty() {
            lines.push(theme::muted(&i18n.t("detail.noData")).to_string());
            return lines;
        }

        lines.push(theme::heading(&i18n.t("detail.hourlyUsage")).to_string());
        lines.push(theme::muted(&glyphs::rule(SEPARATOR_WIDTH)).to_string());

        let start = self.list.scroll_offset();
        for (offset, item) in self.list.visible_items().iter().enumerate() {
            lines.push(self.render_hour(item, start + offset == self.list.selected_index()));
        }
        if self.list.len() > self.list.visible_count() {
            let position = format!("[{}/{}]", self.list.selected_index() + 1, self.list.len());
            lines.push(theme::muted(&position).to_string());
        }

        self.render_summary(&mut lines);
        lines
    }

    fn handle_key(&mut self, key: &KeyEvent, ctx: &mut AppContext) -> bool {
        match key.name {
            KeyName::Escape | KeyName::Char('q') if !key.ctrl => {
                ctx.pop();
                true
            }
            _ => self.list.navigate(key),
        }
    }

    fn footer(&self) -> Option<String> {
        let i18n = &self.services.i18n;
        Some(format_key_help(&[
            ("↑↓", i18n.t("detail.keyScroll")),
            ("ESC/q", i18n.t("detail.keyBack")),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::{ctx, plain, record, services};
    use clusage_core::{MemoryHistoryReader, TokenBreakdown, UsageRecord};
    use clusage_terminal::AppCommand;

    fn day(date: NaiveDate, records: Vec<UsageRecord>) -> DailyUsageFile {
        DailyUsageFile { date, records }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn view(records: Vec<UsageRecord>, date: NaiveDate) -> DetailView {
        DetailView::new(day(date, records), services(MemoryHistoryReader::new()))
    }

    #[test]
    fn test_empty_day_shows_no_data() {
        let view = view(Vec::new(), today());
        let lines = plain(&view.render());
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("2026-10-18 Details"));
        assert_eq!(lines[2], "No data recorded for this date");
    }

    #[test]
    fn test_current_hour_marked_only_today() {
        // The test clock sits at 15:30 UTC
        let records = vec![
            record(2026, 10, 18, 9, 0.2, 0.3),
            record(2026, 10, 18, 15, 0.5, 0.3),
        ];
        let lines = plain(&view(records.clone(), today()).render());
        assert!(lines.iter().any(|l| l.starts_with("15:00 ") && l.ends_with("← now")));
        assert!(!lines.iter().any(|l| l.starts_with("09:00 ") && l.contains("← now")));

        let yesterday = today().pred_opt().unwrap();
        let moved: Vec<_> = records
            .into_iter()
            .map(|mut r| {
                r.timestamp -= chrono::Duration::days(1);
                r
            })
            .collect();
        let lines = plain(&view(moved, yesterday).render());
        assert!(!lines.iter().any(|l| l.contains("← now")));
    }

    #[test]
    fn test_hour_row_layout() {
        let lines = plain(&view(vec![record(2026, 10, 18, 9, 0.5, 0.3)], today()).render());
        assert!(lines.contains(&"09:00 ████░░░░  50%".to_string()));
    }

    #[test]
    fn test_summary_block() {
        let mut peak = record(2026, 10, 18, 11, 0.9, 0.4);
        peak.tokens = Some(TokenBreakdown::new(1_000_000, 0, 0, 0));
        let records = vec![record(2026, 10, 18, 9, 0.1, 0.2), peak];
        let view = view(records, today());
        assert_eq!(view.summary().max_session_hour, Some(11));

        let lines = plain(&view.render());
        assert!(lines.contains(&"Average usage: 50%".to_string()));
        assert!(lines.contains(&"Peak usage: 90% (at 11:00)".to_string()));
        assert!(lines.contains(&"Total tokens: 1,000,000 (Input: 1,000,000 / Output: 0)".to_string()));
        assert!(lines.contains(&"Estimated cost: $3.00".to_string()));
    }

    #[test]
    fn test_scroll_indicator_when_list_overflows() {
        let records = (0..14).map(|h| record(2026, 10, 18, h, 0.1, 0.1)).collect();
        let mut view = view(records, today());
        let mut ctx = ctx();
        assert!(plain(&view.render()).contains(&"[1/14]".to_string()));

        assert!(view.handle_key(&KeyEvent::plain(KeyName::End), &mut ctx));
        assert_eq!(view.selected_index(), 13);
        let lines = plain(&view.render());
        assert!(lines.contains(&"[14/14]".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("13:00")));
        assert!(!lines.iter().any(|l| l.starts_with("00:00")));
    }

    #[test]
    fn test_escape_pops() {
        let mut view = view(Vec::new(), today());
        let mut ctx = ctx();
        assert!(view.handle_key(&KeyEvent::plain(KeyName::Escape), &mut ctx));
        assert!(matches!(ctx.take_commands().as_slice(), [AppCommand::Pop]));
        assert!(!view.handle_key(&KeyEvent::char('x'), &mut ctx));
    }
}
