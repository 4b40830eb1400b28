//! ANSI-aware text measurement and layout
//!
//! Every width computation in the viewer goes through this module. Style
//! codes are stripped before measuring, and East-Asian wide characters
//! (CJK ideographs, Hangul syllables, fullwidth forms) count as two columns,
//! so padded columns line up regardless of language or colour.

use std::borrow::Cow;

/// Ellipsis appended by [`truncate`]
pub const ELLIPSIS: &str = "…";

/// Horizontal alignment for [`pad`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Visible column count of `text`, ignoring style codes
pub fn visible_width(text: &str) -> usize {
    console::measure_text_width(text)
}

/// `text` with every ANSI escape sequence removed
pub fn strip_styles(text: &str) -> Cow<'_, str> {
    console::strip_ansi_codes(text)
}

/// Pad `text` with spaces to `width` visible columns
///
/// Text already at or beyond `width` is returned unchanged. Centering puts
/// the odd leftover column on the right.
pub fn pad(text: &str, width: usize, align: Align) -> String {
    let current = visible_width(text);
    if current >= width {
        return text.to_string();
    }
    let gap = width - current;
    match align {
        Align::Left => format!("{}{}", text, " ".repeat(gap)),
        Align::Right => format!("{}{}", " ".repeat(gap), text),
        Align::Center => {
            let left = gap / 2;
            format!("{}{}{}", " ".repeat(left), text, " ".repeat(gap - left))
        }
    }
}

/// Cut `text` to at most `max` visible columns, ending in `…` when cut
///
/// Style codes survive truncation; a wide character that would straddle the
/// limit is dropped whole.
pub fn truncate(text: &str, max: usize) -> String {
    console::truncate_str(text, max, ELLIPSIS).into_owned()
}

/// Cut `text` to exactly `width` columns without an ellipsis, then pad
pub fn fit(text: &str, width: usize) -> String {
    if visible_width(text) > width {
        pad(&console::truncate_str(text, width, ""), width, Align::Left)
    } else {
        pad(text, width, Align::Left)
    }
}

/// Clamp a utilization to `[0, 1]`; NaN becomes 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Whole percentage of a utilization, clamped
pub fn percent(value: f64) -> u32 {
    (clamp_unit(value) * 100.0).round() as u32
}

/// Group an integer with thousands separators: `1234567` → `1,234,567`
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}
