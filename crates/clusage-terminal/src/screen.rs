//! Double-buffered terminal painter
//!
//! The screen keeps the frame it last wrote next to the frame being built.
//! [`Screen::flush`] compares the two row by row and rewrites only the rows
//! that changed, so an unchanged frame costs no terminal output at all and
//! a cursor move redraws two lines instead of the whole view.
//!
//! The last terminal row is reserved for the footer, which is written
//! separately by [`Screen::paint_footer`] and never touched by a frame
//! flush.

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::Print,
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};
use terminal_size::{Height, Width, terminal_size};
use tracing::trace;

/// Terminal dimensions in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    /// Used when the terminal cannot be queried
    pub const DEFAULT: Size = Size { cols: 80, rows: 24 };

    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Query the controlling terminal, falling back to 80×24
    pub fn detect() -> Self {
        terminal_size()
            .map(|(Width(cols), Height(rows))| Self { cols, rows })
            .unwrap_or(Self::DEFAULT)
    }

    /// Rows available to a frame, excluding the footer row
    pub fn content_rows(&self) -> usize {
        usize::from(self.rows).saturating_sub(1)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A terminal frame writer over any byte sink
pub struct Screen<W: Write> {
    out: W,
    size: Size,
    current: Vec<String>,
    previous: Vec<String>,
    footer: String,
    alternate: bool,
}

impl<W: Write> Screen<W> {
    pub fn new(out: W, size: Size) -> Self {
        let rows = size.content_rows();
        Self {
            out,
            size,
            current: vec![String::new(); rows],
            previous: vec![String::new(); rows],
            footer: String::new(),
            alternate: false,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// The underlying writer
    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Adopt a new size; both buffers are reallocated blank
    ///
    /// The next [`Screen::force_flush`] repaints everything.
    pub fn resize(&mut self, size: Size) {
        if size == self.size {
            return;
        }
        trace!("Screen resized to {}x{}", size.cols, size.rows);
        let rows = size.content_rows();
        self.size = size;
        self.current = vec![String::new(); rows];
        self.previous = vec![String::new(); rows];
    }

    fn clip(&self, line: &str) -> String {
        console::truncate_str(line, usize::from(self.size.cols), "").into_owned()
    }

    /// Replace the whole frame with `lines` and write the rows that changed
    ///
    /// Lines beyond the content area are dropped; missing lines are blank.
    /// Returns the number of rows written.
    pub fn paint(&mut self, lines: &[String]) -> io::Result<usize> {
        self.set_frame(lines);
        self.flush()
    }

    /// Stage `lines` as the next frame without writing anything
    pub fn set_frame(&mut self, lines: &[String]) {
        for row in 0..self.current.len() {
            let line = lines.get(row).map(|l| self.clip(l)).unwrap_or_default();
            self.current[row] = line;
        }
    }

    /// Write every row whose content differs from the last flushed frame
    pub fn flush(&mut self) -> io::Result<usize> {
        let mut written = 0;
        for (row, (now, before)) in self.current.iter().zip(&self.previous).enumerate() {
            if now != before {
                write_row(&mut self.out, row, now)?;
                written += 1;
            }
        }
        self.out.flush()?;
        self.previous.clone_from(&self.current);
        Ok(written)
    }

    /// Clear the terminal and write every row plus the footer
    pub fn force_flush(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All))?;
        for (row, line) in self.current.iter().enumerate() {
            write_row(&mut self.out, row, line)?;
        }
        self.previous.clone_from(&self.current);
        self.write_footer()?;
        self.out.flush()
    }

    /// Rewrite only the last terminal row
    pub fn paint_footer(&mut self, text: &str) -> io::Result<()> {
        self.footer = self.clip(text);
        self.write_footer()?;
        self.out.flush()
    }

    /// Replace the footer text without writing it
    ///
    /// It appears with the next [`Screen::force_flush`].
    pub fn set_footer(&mut self, text: &str) {
        self.footer = self.clip(text);
    }

    fn write_footer(&mut self) -> io::Result<()> {
        if self.size.rows == 0 {
            return Ok(());
        }
        write_row(&mut self.out, self.size.content_rows(), &self.footer)
    }

    /// Switch to the alternate screen and hide the cursor
    pub fn enter_alternate_screen(&mut self) -> io::Result<()> {
        if !self.alternate {
            queue!(self.out, EnterAlternateScreen, Hide)?;
            self.out.flush()?;
            self.alternate = true;
        }
        Ok(())
    }

    /// Restore the main screen and the cursor
    pub fn leave_alternate_screen(&mut self) -> io::Result<()> {
        if self.alternate {
            queue!(self.out, Show, LeaveAlternateScreen)?;
            self.out.flush()?;
            self.alternate = false;
        }
        Ok(())
    }

    /// Show the cursor again without leaving the alternate screen state
    pub fn show_cursor(&mut self) -> io::Result<()> {
        queue!(self.out, Show)?;
        self.out.flush()
    }

    /// Lines of the last flushed frame
    pub fn frame(&self) -> &[String] {
        &self.previous
    }

    pub fn footer(&self) -> &str {
        &self.footer
    }
}

fn write_row<W: Write>(out: &mut W, row: usize, line: &str) -> io::Result<()> {
    let row = u16::try_from(row).unwrap_or(u16::MAX);
    queue!(out, MoveTo(0, row), Clear(ClearType::CurrentLine), Print(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(rows: &[&str]) -> Vec<String> {
        rows.iter().map(|s| s.to_string()).collect()
    }

    fn output(screen: &mut Screen<Vec<u8>>) -> String {
        let bytes = std::mem::take(screen.writer_mut());
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_content_rows_exclude_footer() {
        assert_eq!(Size::new(80, 24).content_rows(), 23);
        assert_eq!(Size::new(80, 0).content_rows(), 0);
    }

    #[test]
    fn test_flush_writes_only_changed_rows() {
        let mut screen = Screen::new(Vec::new(), Size::new(20, 8));
        let first = lines(&["zero", "one", "two", "three", "four"]);
        assert_eq!(screen.paint(&first).unwrap(), 5);
        output(&mut screen);

        let mut second = first.clone();
        second[3] = "THREE".to_string();
        assert_eq!(screen.paint(&second).unwrap(), 1);

        let written = output(&mut screen);
        // MoveTo is 1-based on the wire
        assert!(written.contains("\x1b[4;1H"));
        assert!(written.contains("THREE"));
        for other in ["\x1b[1;1H", "\x1b[2;1H", "\x1b[3;1H", "\x1b[5;1H"] {
            assert!(!written.contains(other), "unexpected write to {other:?}");
        }
    }

    #[test]
    fn test_identical_frame_writes_nothing() {
        let mut screen = Screen::new(Vec::new(), Size::new(20, 6));
        let frame = lines(&["a", "b"]);
        screen.paint(&frame).unwrap();
        output(&mut screen);

        assert_eq!(screen.paint(&frame).unwrap(), 0);
        assert!(output(&mut screen).is_empty());
    }

    #[test]
    fn test_paint_clips_to_width_and_height() {
        let mut screen = Screen::new(Vec::new(), Size::new(5, 3));
        screen
            .paint(&lines(&["abcdefgh", "12", "dropped"]))
            .unwrap();
        assert_eq!(screen.frame(), &["abcde".to_string(), "12".to_string()]);
    }

    #[test]
    fn test_footer_targets_last_row() {
        let mut screen = Screen::new(Vec::new(), Size::new(30, 10));
        screen.paint_footer("q: exit").unwrap();
        let written = output(&mut screen);
        assert!(written.contains("\x1b[10;1H"));
        assert!(written.contains("q: exit"));
        assert_eq!(screen.footer(), "q: exit");
    }

    #[test]
    fn test_force_flush_repaints_everything() {
        let mut screen = Screen::new(Vec::new(), Size::new(20, 4));
        screen.paint(&lines(&["a", "b", "c"])).unwrap();
        output(&mut screen);

        screen.force_flush().unwrap();
        let written = output(&mut screen);
        assert!(written.contains("\x1b[2J"));
        for row in ["\x1b[1;1H", "\x1b[2;1H", "\x1b[3;1H", "\x1b[4;1H"] {
            assert!(written.contains(row));
        }
    }

    #[test]
    fn test_resize_blanks_buffers() {
        let mut screen = Screen::new(Vec::new(), Size::new(20, 4));
        screen.paint(&lines(&["a", "b", "c"])).unwrap();
        screen.resize(Size::new(30, 6));
        assert_eq!(screen.frame().len(), 5);
        assert!(screen.frame().iter().all(String::is_empty));
    }

    #[test]
    fn test_alternate_screen_is_idempotent() {
        let mut screen = Screen::new(Vec::new(), Size::new(20, 4));
        screen.enter_alternate_screen().unwrap();
        screen.enter_alternate_screen().unwrap();
        let written = output(&mut screen);
        assert_eq!(written.matches("\x1b[?1049h").count(), 1);

        screen.leave_alternate_screen().unwrap();
        screen.leave_alternate_screen().unwrap();
        assert_eq!(output(&mut screen).matches("\x1b[?1049l").count(), 1);
    }
}
