//! Display helpers shared by the views and the batch summary

use clusage_core::settings::Currency;
use clusage_core::{I18n, Settings};
use clusage_pricing::CostCalculator;
use clusage_terminal::text::{self, Align, visible_width};
use clusage_terminal::{glyphs, theme};

use crate::aggregation::TrendResult;

/// `  📊 title      [hint]`, bold cyan, padded so the hint ends near `width`
pub fn header_line(title: &str, hint: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(title) + visible_width(hint) + 6);
    theme::title(&format!("  📊 {title}{}{hint}", " ".repeat(padding))).to_string()
}

/// Indented dimmed rule
pub fn separator(width: usize) -> String {
    theme::muted(&format!("  {}", glyphs::rule(width))).to_string()
}

/// Utilization as a whole percentage: `0.456` → `46%`
pub fn percent_label(value: f64) -> String {
    format!("{}%", text::percent(value))
}

/// `label: ██████░░░░ 60%`
pub fn bar_line(label: &str, value: f64, width: usize) -> String {
    format!(
        "  {label}: {} {}",
        glyphs::progress_bar(value, width),
        percent_label(value)
    )
}

pub fn format_usd(usd: f64) -> String {
    format!("${usd:.2}")
}

/// Cost in the configured display currency
///
/// KRW keeps the USD figure and appends the converted amount.
pub fn format_cost(usd: f64, settings: &Settings) -> String {
    match settings.currency() {
        Currency::Usd => format_usd(usd),
        Currency::Krw => {
            let krw = CostCalculator::convert_to_krw(usd, settings.exchange_rate());
            format!("{} (₩{})", format_usd(usd), text::format_number(krw))
        }
    }
}

pub fn format_tokens(tokens: u64) -> String {
    text::format_number(tokens)
}

/// Trend cell of the comparison table
pub fn format_trend(trend: &TrendResult, i18n: &I18n) -> String {
    match trend.change_percent {
        None => theme::muted(&i18n.t("compare.notAvailable")).to_string(),
        Some(p) if p > 0.0 => {
            theme::positive(&format!("{} {:.1}%", i18n.t("compare.increase"), p)).to_string()
        }
        Some(p) if p < 0.0 => {
            theme::negative(&format!("{} {:.1}%", i18n.t("compare.decrease"), p.abs())).to_string()
        }
        Some(_) => theme::muted(&i18n.t("compare.noChange")).to_string(),
    }
}

/// Arrow change used by the histogram: `↑ 12.5%` green or `↓ 3.0%` red
pub fn arrow_change(percent: f64) -> String {
    let text = format!(
        "{} {:.1}%",
        if percent >= 0.0 { '↑' } else { '↓' },
        percent.abs()
    );
    if percent >= 0.0 {
        theme::positive(&text).to_string()
    } else {
        theme::negative(&text).to_string()
    }
}

/// `vs last week: ↑ 12.5%`, with `-` when there is nothing to compare with
pub fn format_trend_line(trend: &TrendResult, period: &str, i18n: &I18n) -> String {
    let label = i18n.t_with("histogram.vsLast", &[("period", &period)]);
    let value = match trend.change_percent {
        None => theme::muted("-").to_string(),
        Some(p) if p == 0.0 => theme::muted("→ 0%").to_string(),
        Some(p) => arrow_change(p),
    };
    format!("{label}: {value}")
}

/// Pad `label` to a fixed number of columns, measuring wide glyphs as two
pub fn column(label: &str, width: usize, align: Align) -> String {
    text::pad(label, width, align)
}
