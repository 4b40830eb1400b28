//! Two-dimensional selection grid

use std::fmt;

use super::{Component, ComponentBase};
use crate::app::AppContext;
use crate::input::{KeyEvent, KeyName};
use crate::theme;

/// Rows of cells with one selected position
///
/// Rows may differ in length; the column is clamped whenever the selection
/// lands on a shorter row. Movement stops at the edges and reports `false`
/// instead of wrapping.
pub struct Grid<T> {
    base: ComponentBase,
    items: Vec<Vec<T>>,
    row: usize,
    col: usize,
}

impl<T> Grid<T> {
    pub fn new() -> Self {
        Self {
            base: ComponentBase::new(),
            items: Vec::new(),
            row: 0,
            col: 0,
        }
    }

    pub fn set_items(&mut self, items: Vec<Vec<T>>) {
        self.items = items;
        self.clamp_selection();
        self.base.mark_dirty();
    }

    pub fn items(&self) -> &[Vec<T>] {
        &self.items
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.row)?.get(self.col)
    }

    /// `(row, col)` of the selection
    pub fn selected_position(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Move the selection to `(row, col)`, clamped into the grid
    pub fn set_selection(&mut self, row: usize, col: usize) {
        self.row = row;
        self.col = col;
        self.clamp_selection();
        self.base.mark_dirty();
    }

    fn row_len(&self, row: usize) -> usize {
        self.items.get(row).map_or(0, Vec::len)
    }

    fn clamp_selection(&mut self) {
        self.row = self.row.min(self.items.len().saturating_sub(1));
        self.col = self.col.min(self.row_len(self.row).saturating_sub(1));
    }

    pub fn move_up(&mut self) -> bool {
        if self.row > 0 {
            self.row -= 1;
            self.clamp_selection();
            self.base.mark_dirty();
            true
        } else {
            false
        }
    }

    pub fn move_down(&mut self) -> bool {
        if self.row + 1 < self.items.len() {
            self.row += 1;
            self.clamp_selection();
            self.base.mark_dirty();
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) -> bool {
        if self.col > 0 {
            self.col -= 1;
            self.base.mark_dirty();
            true
        } else {
            false
        }
    }

    pub fn move_right(&mut self) -> bool {
        if self.col + 1 < self.row_len(self.row) {
            self.col += 1;
            self.base.mark_dirty();
            true
        } else {
            false
        }
    }

    /// Arrow-key movement
    pub fn navigate(&mut self, key: &KeyEvent) -> bool {
        match key.name {
            KeyName::Up => self.move_up(),
            KeyName::Down => self.move_down(),
            KeyName::Left => self.move_left(),
            KeyName::Right => self.move_right(),
            _ => false,
        }
    }

    pub fn base(&self) -> &ComponentBase {
        &self.base
    }
}

impl<T> Grid<Option<T>> {
    fn is_filled(&self, row: usize, col: usize) -> bool {
        matches!(self.items.get(row).and_then(|r| r.get(col)), Some(Some(_)))
    }

    /// Select the first filled cell in row-major order
    pub fn select_first_filled(&mut self) -> bool {
        for (r, row) in self.items.iter().enumerate() {
            if let Some(c) = row.iter().position(Option::is_some) {
                self.row = r;
                self.col = c;
                self.base.mark_dirty();
                return true;
            }
        }
        false
    }

    /// Arrow movement that skips empty cells
    ///
    /// Left and right keep scanning the current row past empty cells. Down
    /// lands on the nearest filled cell at or left of the column in the row
    /// below, up on the nearest at or right of it in the row above. When no
    /// filled cell is found the selection is left untouched and the move
    /// reports `false`.
    pub fn navigate_filled(&mut self, key: &KeyEvent) -> bool {
        let (row, col) = (self.row, self.col);
        let target = match key.name {
            KeyName::Right => (col + 1..self.row_len(row))
                .find(|&c| self.is_filled(row, c))
                .map(|c| (row, c)),
            KeyName::Left => (0..col).rev().find(|&c| self.is_filled(row, c)).map(|c| (row, c)),
            KeyName::Down if row + 1 < self.items.len() => {
                let next = row + 1;
                let start = col.min(self.row_len(next).saturating_sub(1));
                (0..=start)
                    .rev()
                    .find(|&c| self.is_filled(next, c))
                    .map(|c| (next, c))
            }
            KeyName::Up if row > 0 => {
                let prev = row - 1;
                (col..self.row_len(prev))
                    .find(|&c| self.is_filled(prev, c))
                    .map(|c| (prev, c))
            }
            _ => None,
        };
        match target {
            Some((r, c)) => {
                self.row = r;
                self.col = c;
                self.base.mark_dirty();
                true
            }
            None => false,
        }
    }
}

impl<T> Default for Grid<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Display> Component for Grid<T> {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn render(&self) -> Vec<String> {
        self.items
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, cell)| {
                        let text = format!("{:>3}", cell.to_string());
                        if (r, c) == (self.row, self.col) {
                            theme::selected(&text).to_string()
                        } else {
                            text
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    fn handle_key(&mut self, key: &KeyEvent, _ctx: &mut AppContext) -> bool {
        self.navigate(key)
    }
}
