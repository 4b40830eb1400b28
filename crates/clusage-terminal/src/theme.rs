//! Colour and style roles shared by every view
//!
//! Views ask for a role (`title`, `muted`, `selected`) rather than a colour,
//! so the palette is decided in one place. Colouring honours `NO_COLOR`
//! through `colored`'s own detection.

use colored::{ColoredString, Colorize};

use crate::glyphs::WARNING_THRESHOLD;

/// Bold cyan, for view headers
pub fn title(s: &str) -> ColoredString {
    s.bold().cyan()
}

/// Dimmed, for hints and empty cells
pub fn muted(s: &str) -> ColoredString {
    s.dimmed()
}

/// Yellow, for section headings and table headers
pub fn heading(s: &str) -> ColoredString {
    s.yellow()
}

/// Bold yellow, for the label of a selected item's detail block
pub fn emphasis(s: &str) -> ColoredString {
    s.yellow().bold()
}

/// Inverse video, for the selected row or cell
pub fn selected(s: &str) -> ColoredString {
    s.on_white().black()
}

/// Underlined bold, for today's date
pub fn today(s: &str) -> ColoredString {
    s.underline().bold()
}

pub fn positive(s: &str) -> ColoredString {
    s.green()
}

pub fn negative(s: &str) -> ColoredString {
    s.red()
}

pub fn warning(s: &str) -> ColoredString {
    s.yellow()
}

/// Cyan, for the highlighted bar or active mode
pub fn accent(s: &str) -> ColoredString {
    s.cyan()
}

/// Bold cyan marker for the active choice among several
pub fn active(s: &str) -> ColoredString {
    s.cyan().bold()
}

/// Colour a usage bar by how close it is to the limit
pub fn usage(s: &str, value: f64) -> ColoredString {
    if value >= WARNING_THRESHOLD {
        warning(s)
    } else {
        positive(s)
    }
}
