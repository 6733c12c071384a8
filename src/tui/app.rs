use crate::config::Config;
use crate::core::AnalysisContext;
use crate::services::{StatusErrorSink, VectorSource};
use crate::tui::components::{
    ApplyOutcome, CorrelationChart, DrillDownFactory, DrillDownLauncher, ListEvent, ListFocus,
    RowResponse, SelectionList,
};
use crate::tui::{Action, Component, Focusable, KeyBindings, Theme};
use color_eyre::Result;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Input focus, cycled with NextPane / PrevPane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Filter,
    List,
    Chart,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Filter => Pane::List,
            Pane::List => Pane::Chart,
            Pane::Chart => Pane::Filter,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Filter => Pane::Chart,
            Pane::List => Pane::Filter,
            Pane::Chart => Pane::List,
        }
    }
}

const BUTTON_LABEL: &str = "Display heatmap";

const HINT_ACTIONS: [Action; 5] = [
    Action::NextPane,
    Action::FocusFilter,
    Action::DisplayHeatmap,
    Action::Refresh,
    Action::Quit,
];

/// Correlation explorer screen
///
/// Owns the analysis context and routes input between the variable list,
/// the chart and the drill-down modal.
pub struct App {
    context: AnalysisContext,

    selection: SelectionList,

    chart: CorrelationChart,

    launcher: DrillDownLauncher,

    /// Receives every I/O failure; its latest message is shown in the status bar
    sink: Arc<StatusErrorSink>,

    focus: Pane,

    keybindings: KeyBindings,

    theme: Theme,

    list_width_percent: u16,

    /// Areas from the last draw, for mouse routing
    list_area: Rect,
    button_area: Rect,
    chart_area: Rect,

    should_quit: bool,
}

impl App {
    pub fn new(
        context: AnalysisContext,
        source: Arc<dyn VectorSource>,
        sink: Arc<StatusErrorSink>,
        factory: DrillDownFactory,
        responses: UnboundedSender<RowResponse>,
        config: &Config,
    ) -> Self {
        let theme = Theme::from_name(config.ui.theme);
        let chart = CorrelationChart::new(
            context.clone(),
            source,
            sink.clone(),
            responses,
            config.chart.clone(),
            theme.clone(),
        );
        let launcher = DrillDownLauncher::new(context.clone(), factory, sink.clone(), theme.clone());
        let mut app = Self {
            context,
            selection: SelectionList::new(theme.clone()),
            chart,
            launcher,
            sink,
            focus: Pane::List,
            keybindings: KeyBindings::default(),
            theme,
            list_width_percent: config.ui.list_width_percent.clamp(10, 90),
            list_area: Rect::default(),
            button_area: Rect::default(),
            chart_area: Rect::default(),
            should_quit: false,
        };
        app.apply_focus();
        app
    }

    /// Populate the list from the catalog; selecting its first entry issues
    /// the first chart request. Must run inside a tokio runtime.
    pub fn start(&mut self) {
        let names = self.context.catalog.names().to_vec();
        debug!("starting with {} variables", names.len());
        self.selection.set_catalog(names);
        self.forward_selection();
    }

    /// Handle a key event
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        // The modal captures all input while open
        if self.launcher.is_open() {
            if let Some(action) = self.keybindings.get_action(&key) {
                self.launcher.handle_action(action)?;
            }
            return Ok(());
        }

        // Filter input gets plain characters and editing keys first
        if self.selection.accepts_text() && self.handle_filter_key(&key) {
            return Ok(());
        }

        if let Some(action) = self.keybindings.get_action(&key) {
            self.handle_action(action)?;
        }
        Ok(())
    }

    fn handle_filter_key(&mut self, key: &KeyEvent) -> bool {
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match key.code {
            KeyCode::Char(c) if plain => self.selection.insert_char(c),
            KeyCode::Backspace => self.selection.backspace(),
            KeyCode::Delete => self.selection.delete(),
            KeyCode::Left => self.selection.cursor_left(),
            KeyCode::Right => self.selection.cursor_right(),
            _ => return false,
        }
        true
    }

    /// Handle an action
    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.should_quit = true;
                return Ok(());
            }
            Action::NextPane => self.set_focus(self.focus.next()),
            Action::PrevPane => self.set_focus(self.focus.prev()),
            Action::FocusFilter => self.set_focus(Pane::Filter),
            Action::ClearFilter => {
                self.selection.handle_action(Action::ClearFilter)?;
            }
            Action::DisplayHeatmap => self.launch_drill_down(),
            Action::Refresh => {
                self.sink.clear();
                self.chart.refresh();
            }
            other => {
                let handled = match self.focus {
                    Pane::Filter | Pane::List => self.selection.handle_action(other)?,
                    Pane::Chart => self.chart.handle_action(other)?,
                };
                if !handled && other == Action::Cancel {
                    self.sink.clear();
                }
                self.sync_focus_from_selection();
            }
        }
        self.forward_selection();
        Ok(())
    }

    /// Handle a mouse event
    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<()> {
        if self.launcher.is_open() {
            return Ok(());
        }
        let position = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.button_area.contains(position) {
                    self.launch_drill_down();
                } else if self.list_area.contains(position) {
                    if self.selection.handle_mouse(mouse)? {
                        self.set_focus(Pane::List);
                    } else {
                        // clicks above the list land in the filter input
                        self.set_focus(Pane::Filter);
                    }
                } else if self.chart_area.contains(position) {
                    self.set_focus(Pane::Chart);
                }
            }
            // hover exit must reach the chart too, so it sees every move
            _ => {
                self.chart.handle_mouse(mouse)?;
            }
        }
        self.forward_selection();
        Ok(())
    }

    /// Deliver a fetch response to the chart
    pub fn on_response(&mut self, response: RowResponse) -> ApplyOutcome {
        self.chart.apply(response)
    }

    fn launch_drill_down(&mut self) {
        let name = self
            .selection
            .selected()
            .map(str::to_string)
            .or_else(|| self.chart.model().map(|m| m.selected.clone()));
        match name {
            // failures are already reported to the sink
            Some(name) => {
                let _ = self.launcher.launch(&name);
            }
            None => debug!("no selection to drill into"),
        }
    }

    /// Pass list selection changes through to the chart
    fn forward_selection(&mut self) {
        while let Some(ListEvent::SelectionChanged(name)) = self.selection.take_event() {
            self.chart.render(&name);
        }
    }

    fn set_focus(&mut self, pane: Pane) {
        self.focus = pane;
        self.apply_focus();
    }

    fn apply_focus(&mut self) {
        let list_pane = matches!(self.focus, Pane::Filter | Pane::List);
        self.selection.set_focused(list_pane);
        self.selection.set_focus(if self.focus == Pane::Filter {
            ListFocus::Filter
        } else {
            ListFocus::Options
        });
        self.chart.set_focused(self.focus == Pane::Chart);
    }

    /// The list switches between its filter and options on its own
    fn sync_focus_from_selection(&mut self) {
        if matches!(self.focus, Pane::Filter | Pane::List) {
            self.focus = match self.selection.focus() {
                ListFocus::Filter => Pane::Filter,
                ListFocus::Options => Pane::List,
            };
        }
    }

    /// Render the app
    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(self.list_width_percent),
                Constraint::Percentage(100 - self.list_width_percent),
            ])
            .split(rows[0]);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(3)])
            .split(columns[0]);

        self.list_area = left[0];
        self.button_area = left[1];
        self.chart_area = columns[1];

        self.selection.draw(frame, left[0]);
        let button = Paragraph::new(Line::from(Span::styled(
            format!("[ {BUTTON_LABEL} ]"),
            self.theme.info_style(),
        )))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(self.theme.border_style(false)),
        );
        frame.render_widget(button, left[1]);
        self.chart.draw(frame, columns[1]);
        self.draw_status(frame, rows[1]);

        self.launcher.draw(frame, area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let line = match self.sink.last_message() {
            Some(message) => Line::from(Span::styled(message, self.theme.error_style())),
            None => Line::from(Span::styled(
                self.keybindings.hints(&HINT_ACTIONS),
                self.theme.muted_style(),
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn focus(&self) -> Pane {
        self.focus
    }

    pub fn selection(&self) -> &SelectionList {
        &self.selection
    }

    pub fn chart(&self) -> &CorrelationChart {
        &self.chart
    }

    pub fn launcher(&self) -> &DrillDownLauncher {
        &self.launcher
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn keybindings(&self) -> &KeyBindings {
        &self.keybindings
    }

    pub fn set_keybindings(&mut self, keybindings: KeyBindings) {
        self.keybindings = keybindings;
    }
}
