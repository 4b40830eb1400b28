//! Box-drawing glyph sets and progress bars
//!
//! Box outlines are built from one of three interchangeable glyph sets
//! chosen by [`BoxStyle`], so a call site never hard-codes corner glyphs.

use crate::text;

/// Filled progress bar cell
pub const PROGRESS_FULL: &str = "█";
/// Empty progress bar cell
pub const PROGRESS_EMPTY: &str = "░";

/// Utilization at which bars switch to the warning colour
pub const WARNING_THRESHOLD: f64 = 0.8;

/// Outline style for [`draw_box`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoxStyle {
    Double,
    #[default]
    Single,
    Round,
}

/// The glyphs one [`BoxStyle`] draws with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxChars {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
    /// Joins the border to the left edge of a title
    pub title_left: char,
    /// Joins a title back to the border on its right
    pub title_right: char,
}

const DOUBLE: BoxChars = BoxChars {
    top_left: '╔',
    top_right: '╗',
    bottom_left: '╚',
    bottom_right: '╝',
    horizontal: '═',
    vertical: '║',
    title_left: '╣',
    title_right: '╠',
};

const SINGLE: BoxChars = BoxChars {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
    title_left: '┤',
    title_right: '├',
};

const ROUND: BoxChars = BoxChars {
    top_left: '╭',
    top_right: '╮',
    bottom_left: '╰',
    bottom_right: '╯',
    horizontal: '─',
    vertical: '│',
    title_left: '┤',
    title_right: '├',
};

impl BoxStyle {
    pub fn chars(&self) -> &'static BoxChars {
        match self {
            Self::Double => &DOUBLE,
            Self::Single => &SINGLE,
            Self::Round => &ROUND,
        }
    }
}

fn repeat(c: char, n: usize) -> String {
    std::iter::repeat_n(c, n).collect()
}

/// Outline of a `width` × `height` box as lines
///
/// With a title, the top border reads `┌─┤ title ├───┐`. The title is
/// dropped when it would not leave room for the corners, both connectors
/// and one horizontal on each side.
pub fn draw_box(width: usize, height: usize, title: Option<&str>, style: BoxStyle) -> Vec<String> {
    if width < 2 || height < 2 {
        return Vec::new();
    }
    let chars = style.chars();
    let inner = width - 2;

    let top_inner = match title {
        Some(title) if !title.is_empty() => {
            let label = format!(" {} ", title);
            let label_width = text::visible_width(&label);
            if label_width + 4 <= inner {
                let rest = inner - label_width - 3;
                format!(
                    "{}{}{}{}{}",
                    chars.horizontal,
                    chars.title_left,
                    label,
                    chars.title_right,
                    repeat(chars.horizontal, rest)
                )
            } else {
                repeat(chars.horizontal, inner)
            }
        }
        _ => repeat(chars.horizontal, inner),
    };

    let mut lines = Vec::with_capacity(height);
    lines.push(format!("{}{}{}", chars.top_left, top_inner, chars.top_right));
    for _ in 0..height - 2 {
        lines.push(format!("{}{}{}", chars.vertical, " ".repeat(inner), chars.vertical));
    }
    lines.push(format!(
        "{}{}{}",
        chars.bottom_left,
        repeat(chars.horizontal, inner),
        chars.bottom_right
    ));
    lines
}

/// A box of `width` sized to hold `content`, each line padded or cut to fit
pub fn fill_box(content: &[String], width: usize, title: Option<&str>, style: BoxStyle) -> Vec<String> {
    let mut lines = draw_box(width, content.len() + 2, title, style);
    if lines.is_empty() {
        return lines;
    }
    let chars = style.chars();
    let inner = width - 2;
    for (row, line) in content.iter().enumerate() {
        lines[row + 1] = format!("{}{}{}", chars.vertical, text::fit(line, inner), chars.vertical);
    }
    lines
}

/// Fixed-width bar of `█` and `░` for a utilization
///
/// The filled cell count is `round(clamp(value) * width)`.
pub fn progress_bar(value: f64, width: usize) -> String {
    let filled = filled_cells(value, width);
    format!(
        "{}{}",
        PROGRESS_FULL.repeat(filled),
        PROGRESS_EMPTY.repeat(width - filled)
    )
}

/// Number of filled cells [`progress_bar`] draws
pub fn filled_cells(value: f64, width: usize) -> usize {
    ((text::clamp_unit(value) * width as f64).round() as usize).min(width)
}

/// A horizontal rule of `width` columns
pub fn rule(width: usize) -> String {
    repeat(SINGLE.horizontal, width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_draw_box_plain() {
        let lines = draw_box(6, 3, None, BoxStyle::Single);
        assert_eq!(lines, vec!["┌────┐", "│    │", "└────┘"]);

        let lines = draw_box(4, 2, None, BoxStyle::Double);
        assert_eq!(lines, vec!["╔══╗", "╚══╝"]);
    }

    #[test]
    fn test_draw_box_title() {
        let lines = draw_box(16, 2, Some("Info"), BoxStyle::Round);
        assert_eq!(lines[0], "╭─┤ Info ├─────╮");
        assert_eq!(text::visible_width(&lines[0]), 16);
        assert_eq!(lines[1], "╰──────────────╯");
    }

    #[test]
    fn test_draw_box_title_too_long_is_dropped() {
        let lines = draw_box(10, 2, Some("Much too long"), BoxStyle::Single);
        assert_eq!(lines[0], "┌────────┐");
    }

    #[test]
    fn test_draw_box_degenerate() {
        assert!(draw_box(1, 5, None, BoxStyle::Single).is_empty());
        assert!(draw_box(5, 1, None, BoxStyle::Single).is_empty());
    }

    #[test]
    fn test_fill_box_fits_content() {
        let content = vec!["abc".to_string(), "a much longer line".to_string()];
        let lines = fill_box(&content, 8, None, BoxStyle::Single);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "│abc   │");
        assert_eq!(lines[2], "│a much│");
        for line in &lines {
            assert_eq!(text::visible_width(line), 8);
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.5, 8), "████░░░░");
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(1.5, 4), "████");
        assert_eq!(progress_bar(-1.0, 4), "░░░░");
        assert_eq!(progress_bar(f64::NAN, 4), "░░░░");
    }

    proptest! {
        #[test]
        fn prop_progress_bar_fill_matches_rounded_clamp(v in -2.0f64..3.0, width in 0usize..60) {
            let bar = progress_bar(v, width);
            let filled = bar.chars().filter(|c| *c == '█').count();
            let expected = (v.clamp(0.0, 1.0) * width as f64).round() as usize;
            prop_assert_eq!(filled, expected);
            prop_assert_eq!(bar.chars().count(), width);
        }
    }
}
