//! Filterable list of variable names.
//!
//! Every change of the visible selection is forwarded unchanged as a
//! `ListEvent`; the list itself derives nothing from the selection.

use crate::tui::{Action, Component, Focusable, Theme};
use color_eyre::Result;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tracing::debug;

/// Notification emitted when the visible selection changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    SelectionChanged(String),
}

/// Which half of the component receives input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFocus {
    Filter,
    Options,
}

pub struct SelectionList {
    /// Full catalog in order
    names: Vec<String>,
    /// Names passing the current filter
    visible: Vec<String>,
    query: String,
    /// Cursor position in `query`, in chars
    cursor: usize,
    /// Active value; survives being filtered out of `visible`
    selected: Option<String>,
    list_state: ListState,
    focus: ListFocus,
    focused: bool,
    pending: Option<ListEvent>,
    list_area: Rect,
    theme: Theme,
    supported_actions: Vec<Action>,
}

impl SelectionList {
    pub fn new(theme: Theme) -> Self {
        Self {
            names: Vec::new(),
            visible: Vec::new(),
            query: String::new(),
            cursor: 0,
            selected: None,
            list_state: ListState::default(),
            focus: ListFocus::Options,
            focused: false,
            pending: None,
            list_area: Rect::default(),
            theme,
            supported_actions: vec![
                Action::MoveUp,
                Action::MoveDown,
                Action::PageUp,
                Action::PageDown,
                Action::GoToTop,
                Action::GoToBottom,
                Action::FocusFilter,
                Action::ClearFilter,
                Action::Confirm,
                Action::Cancel,
            ],
        }
    }

    /// Replace the selectable set and select its first entry.
    ///
    /// Emits a selection change for that entry so the chart re-renders.
    pub fn set_catalog(&mut self, names: Vec<String>) {
        self.names = names;
        self.query.clear();
        self.cursor = 0;
        self.visible = self.names.clone();
        self.selected = None;
        self.list_state = ListState::default();
        if !self.visible.is_empty() {
            self.select_visible(0);
        }
    }

    /// Case-insensitive substring filter over the full catalog.
    ///
    /// The selected value is kept even if it is filtered out; it is only
    /// highlighted while visible.
    pub fn filter(&mut self, query: &str) {
        self.query = query.to_string();
        self.cursor = self.cursor.min(self.query.chars().count());
        let needle = self.query.to_lowercase();
        self.visible = if needle.is_empty() {
            self.names.clone()
        } else {
            self.names
                .iter()
                .filter(|n| n.to_lowercase().contains(&needle))
                .cloned()
                .collect()
        };
        let index = self
            .selected
            .as_ref()
            .and_then(|s| self.visible.iter().position(|n| n == s));
        self.list_state.select(index);
        debug!(
            "filter '{}' matches {} of {}",
            self.query,
            self.visible.len(),
            self.names.len()
        );
    }

    /// Forward a selection change from the UI unchanged
    pub fn on_selection_change(&mut self, name: &str) {
        self.selected = Some(name.to_string());
        self.pending = Some(ListEvent::SelectionChanged(name.to_string()));
    }

    /// Take the pending notification, if any
    pub fn take_event(&mut self) -> Option<ListEvent> {
        self.pending.take()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn visible(&self) -> &[String] {
        &self.visible
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn focus(&self) -> ListFocus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: ListFocus) {
        self.focus = focus;
    }

    /// Whether typed characters should go into the filter input
    pub fn accepts_text(&self) -> bool {
        self.focused && self.focus == ListFocus::Filter
    }

    pub fn insert_char(&mut self, c: char) {
        let byte = self.byte_index(self.cursor);
        let mut query = self.query.clone();
        query.insert(byte, c);
        self.cursor += 1;
        self.filter(&query);
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut chars: Vec<char> = self.query.chars().collect();
        chars.remove(self.cursor - 1);
        self.cursor -= 1;
        let query: String = chars.into_iter().collect();
        self.filter(&query);
    }

    pub fn delete(&mut self) {
        let mut chars: Vec<char> = self.query.chars().collect();
        if self.cursor < chars.len() {
            chars.remove(self.cursor);
            let query: String = chars.into_iter().collect();
            self.filter(&query);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.query.chars().count());
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.query
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.query.len())
    }

    /// Highlight a visible row and emit the change if the value differs
    fn select_visible(&mut self, index: usize) {
        let Some(name) = self.visible.get(index).cloned() else {
            return;
        };
        self.list_state.select(Some(index));
        if self.selected.as_deref() != Some(name.as_str()) {
            self.on_selection_change(&name);
        }
    }

    fn move_by(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() - 1;
        let target = match self.list_state.selected() {
            Some(current) => current.saturating_add_signed(delta).min(last),
            None if delta < 0 => last,
            None => 0,
        };
        self.select_visible(target);
    }

    fn page_size(&self) -> isize {
        self.list_area.height.saturating_sub(2).max(1) as isize
    }
}

impl Component for SelectionList {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::MoveUp => self.move_by(-1),
            Action::MoveDown => self.move_by(1),
            Action::PageUp => self.move_by(-self.page_size()),
            Action::PageDown => self.move_by(self.page_size()),
            Action::GoToTop => self.select_visible(0),
            Action::GoToBottom => {
                let last = self.visible.len().saturating_sub(1);
                self.select_visible(last);
            }
            Action::FocusFilter => self.focus = ListFocus::Filter,
            Action::ClearFilter => {
                self.cursor = 0;
                self.filter("");
            }
            Action::Confirm | Action::Cancel if self.focus == ListFocus::Filter => {
                self.focus = ListFocus::Options;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<bool> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(false);
        }
        let inner = Block::default().borders(Borders::ALL).inner(self.list_area);
        if !inner.contains(Position::new(mouse.column, mouse.row)) {
            return Ok(false);
        }
        let index = (mouse.row - inner.y) as usize + self.list_state.offset();
        self.focus = ListFocus::Options;
        self.select_visible(index);
        Ok(true)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let filter_focused = self.focused && self.focus == ListFocus::Filter;
        let filter_block = Block::default()
            .borders(Borders::ALL)
            .title("Filter")
            .border_style(self.theme.border_style(filter_focused));
        let filter_line = if self.query.is_empty() && !filter_focused {
            Line::from(Span::styled("Filter data list", self.theme.muted_style()))
        } else {
            Line::from(self.query.as_str())
        };
        let filter_inner = filter_block.inner(chunks[0]);
        frame.render_widget(Paragraph::new(filter_line).block(filter_block), chunks[0]);
        if filter_focused {
            let prefix: String = self.query.chars().take(self.cursor).collect();
            let x = filter_inner.x + (prefix.chars().count() as u16).min(filter_inner.width);
            frame.set_cursor_position(Position::new(x, filter_inner.y));
        }

        self.list_area = chunks[1];
        let options_focused = self.focused && self.focus == ListFocus::Options;
        let title = format!("Variables ({}/{})", self.visible.len(), self.names.len());
        let items: Vec<ListItem> = self
            .visible
            .iter()
            .map(|n| ListItem::new(n.as_str()))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(self.theme.border_style(options_focused)),
            )
            .style(Style::default().fg(self.theme.foreground))
            .highlight_style(self.theme.selected_style());
        frame.render_stateful_widget(list, chunks[1], &mut self.list_state);
    }

    fn supported_actions(&self) -> &[Action] {
        &self.supported_actions
    }

    fn name(&self) -> &str {
        "SelectionList"
    }
}

impl Focusable for SelectionList {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn list_with(names: &[&str]) -> SelectionList {
        let mut list = SelectionList::new(Theme::default());
        list.set_catalog(names.iter().map(|s| s.to_string()).collect());
        list
    }

    fn changed(name: &str) -> Option<ListEvent> {
        Some(ListEvent::SelectionChanged(name.to_string()))
    }

    #[test]
    fn test_set_catalog_selects_first_entry() {
        let mut list = list_with(&["Alpha", "beta", "Gamma"]);
        assert_eq!(list.selected(), Some("Alpha"));
        assert_eq!(list.take_event(), changed("Alpha"));
        assert_eq!(list.take_event(), None);
    }

    #[test]
    fn test_set_catalog_always_emits() {
        let mut list = list_with(&["Alpha", "beta"]);
        list.take_event();
        list.set_catalog(vec!["Alpha".to_string(), "Delta".to_string()]);
        assert_eq!(list.take_event(), changed("Alpha"));
    }

    #[test]
    fn test_filter_is_case_insensitive_over_full_catalog() {
        let mut list = list_with(&["H3K4me3", "h3k27ac", "CTCF", "Pol2"]);
        list.filter("H3K");
        assert_eq!(list.visible(), &["H3K4me3".to_string(), "h3k27ac".to_string()]);

        // narrowing then widening searches the full catalog again
        list.filter("h3k27");
        assert_eq!(list.visible().len(), 1);
        list.filter("c");
        assert_eq!(
            list.visible(),
            &["h3k27ac".to_string(), "CTCF".to_string()]
        );

        list.filter("");
        assert_eq!(list.visible().len(), 4);
    }

    #[test]
    fn test_filter_keeps_whitespace() {
        let mut list = list_with(&["Pol II S5P", "beta", "H3K27ac"]);
        list.filter(" ");
        assert_eq!(list.visible(), &["Pol II S5P".to_string()]);

        list.filter(" b");
        assert!(list.visible().is_empty());

        list.filter("  ");
        assert!(list.visible().is_empty());
    }

    #[test]
    fn test_selection_survives_filtering_out() {
        let mut list = list_with(&["Alpha", "Beta", "Gamma"]);
        list.take_event();

        list.filter("gam");
        assert_eq!(list.selected(), Some("Alpha"));
        assert_eq!(list.take_event(), None);

        // changing the visible selection fires on the new value
        list.handle_action(Action::MoveDown).unwrap();
        assert_eq!(list.selected(), Some("Gamma"));
        assert_eq!(list.take_event(), changed("Gamma"));

        list.filter("");
        assert_eq!(list.list_state.selected(), Some(2));
    }

    #[test]
    fn test_navigation_emits_each_change() {
        let mut list = list_with(&["A", "B", "C"]);
        list.take_event();

        list.handle_action(Action::MoveDown).unwrap();
        assert_eq!(list.take_event(), changed("B"));
        list.handle_action(Action::GoToBottom).unwrap();
        assert_eq!(list.take_event(), changed("C"));
        // already at the bottom: no change, no event
        list.handle_action(Action::MoveDown).unwrap();
        assert_eq!(list.take_event(), None);
        list.handle_action(Action::GoToTop).unwrap();
        assert_eq!(list.take_event(), changed("A"));
    }

    #[test]
    fn test_text_editing() {
        let mut list = list_with(&["alpha", "beta"]);
        list.set_focused(true);
        list.handle_action(Action::FocusFilter).unwrap();
        assert!(list.accepts_text());

        list.insert_char('b');
        list.insert_char('t');
        assert_eq!(list.query(), "bt");
        assert!(list.visible().is_empty());

        list.cursor_left();
        list.insert_char('e');
        assert_eq!(list.query(), "bet");
        assert_eq!(list.visible(), &["beta".to_string()]);

        list.backspace();
        list.delete();
        assert_eq!(list.query(), "b");

        list.handle_action(Action::ClearFilter).unwrap();
        assert_eq!(list.visible().len(), 2);

        list.handle_action(Action::Cancel).unwrap();
        assert_eq!(list.focus(), ListFocus::Options);
    }

    #[test]
    fn test_empty_catalog() {
        let mut list = list_with(&[]);
        assert_eq!(list.selected(), None);
        assert_eq!(list.take_event(), None);
        list.handle_action(Action::MoveDown).unwrap();
        assert_eq!(list.take_event(), None);
    }
}
