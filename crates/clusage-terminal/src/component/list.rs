//! Single-selection list with a scrolling window

use std::fmt;

use super::{Component, ComponentBase};
use crate::app::AppContext;
use crate::input::{KeyEvent, KeyName};
use crate::theme;

/// Rows a list shows when no other size is given
pub const DEFAULT_VISIBLE_COUNT: usize = 10;

/// A list with one selected item and a window of `visible_count` rows
///
/// The scroll offset follows the selection so the selected item is always
/// inside the window.
pub struct SelectableList<T> {
    base: ComponentBase,
    items: Vec<T>,
    selected: usize,
    scroll: usize,
    visible_count: usize,
}

impl<T> SelectableList<T> {
    pub fn new(visible_count: usize) -> Self {
        Self {
            base: ComponentBase::new(),
            items: Vec::new(),
            selected: 0,
            scroll: 0,
            visible_count: visible_count.max(1),
        }
    }

    /// Replace the items, keeping the selection in range
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.selected = self.selected.min(self.items.len().saturating_sub(1));
        self.adjust_scroll();
        self.base.mark_dirty();
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// The items inside the scroll window
    pub fn visible_items(&self) -> &[T] {
        let end = (self.scroll + self.visible_count).min(self.items.len());
        &self.items[self.scroll.min(end)..end]
    }

    pub fn select_next(&mut self) -> bool {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
            self.adjust_scroll();
            self.base.mark_dirty();
            true
        } else {
            false
        }
    }

    pub fn select_prev(&mut self) -> bool {
        if self.selected > 0 {
            self.selected -= 1;
            self.adjust_scroll();
            self.base.mark_dirty();
            true
        } else {
            false
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll = 0;
        self.base.mark_dirty();
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
        self.adjust_scroll();
        self.base.mark_dirty();
    }

    /// Select `index` if it exists
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.selected = index;
            self.adjust_scroll();
            self.base.mark_dirty();
            true
        } else {
            false
        }
    }

    fn adjust_scroll(&mut self) {
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + self.visible_count {
            self.scroll = self.selected + 1 - self.visible_count;
        }
    }

    /// Up/Down/Home/End navigation
    pub fn navigate(&mut self, key: &KeyEvent) -> bool {
        match key.name {
            KeyName::Up => self.select_prev(),
            KeyName::Down => self.select_next(),
            KeyName::Home => {
                self.select_first();
                true
            }
            KeyName::End => {
                self.select_last();
                true
            }
            _ => false,
        }
    }

    pub fn base(&self) -> &ComponentBase {
        &self.base
    }
}

impl<T: fmt::Display> Component for SelectableList<T> {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn render(&self) -> Vec<String> {
        self.visible_items()
            .iter()
            .enumerate()
            .map(|(offset, item)| {
                let line = item.to_string();
                if self.scroll + offset == self.selected {
                    theme::selected(&line).to_string()
                } else {
                    line
                }
            })
            .collect()
    }

    fn handle_key(&mut self, key: &KeyEvent, _ctx: &mut AppContext) -> bool {
        self.navigate(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::strip_styles;

    fn list(n: usize, visible: usize) -> SelectableList<usize> {
        let mut list = SelectableList::new(visible);
        list.set_items((0..n).collect());
        list
    }

    #[test]
    fn test_scroll_follows_selection() {
        let mut list = list(20, 5);
        for _ in 0..7 {
            assert!(list.select_next());
        }
        assert_eq!(list.selected_index(), 7);
        assert_eq!(list.scroll_offset(), 3);
        assert_eq!(list.visible_items(), &[3, 4, 5, 6, 7]);

        for _ in 0..5 {
            list.select_prev();
        }
        assert_eq!(list.selected_index(), 2);
        assert_eq!(list.scroll_offset(), 2);
    }

    #[test]
    fn test_bounds_are_not_handled() {
        let mut list = list(3, 5);
        assert!(!list.select_prev());
        list.select_last();
        assert_eq!(list.selected_index(), 2);
        assert!(!list.select_next());
    }

    #[test]
    fn test_home_end_jump() {
        let mut list = list(30, 10);
        assert!(list.navigate(&KeyEvent::plain(KeyName::End)));
        assert_eq!(list.selected_index(), 29);
        assert_eq!(list.scroll_offset(), 20);
        assert!(list.navigate(&KeyEvent::plain(KeyName::Home)));
        assert_eq!(list.selected_index(), 0);
        assert_eq!(list.scroll_offset(), 0);
        assert!(!list.navigate(&KeyEvent::plain(KeyName::Left)));
    }

    #[test]
    fn test_set_items_clamps_selection() {
        let mut list = list(10, 4);
        list.select_last();
        list.set_items(vec![1, 2]);
        assert_eq!(list.selected_index(), 1);
        assert_eq!(list.visible_items(), &[1, 2]);

        list.set_items(Vec::new());
        assert_eq!(list.selected_index(), 0);
        assert!(list.selected_item().is_none());
        assert!(list.visible_items().is_empty());
    }

    #[test]
    fn test_render_marks_selected() {
        colored::control::set_override(true);
        let mut list = list(3, 5);
        list.select_next();
        let lines = list.render();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "0");
        assert_ne!(lines[1], "1");
        assert_eq!(strip_styles(&lines[1]), "1");
    }
}
