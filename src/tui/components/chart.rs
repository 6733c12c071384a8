//! Correlation vector chart.
//!
//! `render` issues a fetch for one variable; `apply` receives the response
//! and, only if it answers the most recent request, replaces the displayed
//! entries wholesale. Layout is recomputed from those entries on every draw,
//! so identical inputs always produce identical cells.

use crate::core::layout::{column_span, format_value, order_entries, pair_entries, LineStyle};
use crate::core::{
    AnalysisContext, ChartConfig, ChartGeometry, CorrError, CorrelationRow, DisplayEntry,
    RequestToken,
};
use crate::services::{ErrorSink, VectorSource};
use crate::tui::{Action, Component, Focusable, Theme};
use color_eyre::Result;
use crossterm::event::{MouseEvent, MouseEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Response to a row request, tagged with the token it was issued under
#[derive(Debug)]
pub struct RowResponse {
    pub token: RequestToken,
    pub name: String,
    pub result: Result<CorrelationRow, CorrError>,
}

/// What `apply` did with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Rendered,
    /// Superseded by a newer request; dropped without side effects
    Stale,
    /// Reported to the error sink; previous chart kept
    Failed,
}

/// Entries currently on screen
#[derive(Debug, Clone, PartialEq)]
pub struct ChartModel {
    pub selected: String,
    pub entries: Vec<DisplayEntry>,
}

/// Horizontal scroll step for the mouse wheel, in cells
const WHEEL_STEP: u16 = 4;

pub struct CorrelationChart {
    context: AnalysisContext,
    source: Arc<dyn VectorSource>,
    sink: Arc<dyn ErrorSink>,
    responses: UnboundedSender<RowResponse>,
    latest: RequestToken,
    /// Name of the outstanding latest request
    pending: Option<String>,
    model: Option<ChartModel>,
    config: ChartConfig,
    theme: Theme,
    hover: Option<usize>,
    scroll: u16,
    focused: bool,
    /// Inner area and layout of the last draw, used for hit-testing
    last_inner: Rect,
    last_geometry: Option<ChartGeometry>,
    supported_actions: Vec<Action>,
}

impl CorrelationChart {
    pub fn new(
        context: AnalysisContext,
        source: Arc<dyn VectorSource>,
        sink: Arc<dyn ErrorSink>,
        responses: UnboundedSender<RowResponse>,
        config: ChartConfig,
        theme: Theme,
    ) -> Self {
        Self {
            context,
            source,
            sink,
            responses,
            latest: RequestToken::default(),
            pending: None,
            model: None,
            config,
            theme,
            hover: None,
            scroll: 0,
            focused: false,
            last_inner: Rect::default(),
            last_geometry: None,
            supported_actions: vec![
                Action::MoveLeft,
                Action::MoveRight,
                Action::GoToTop,
                Action::GoToBottom,
                Action::Cancel,
            ],
        }
    }

    /// Request the correlation row for `name`.
    ///
    /// Supersedes any outstanding request: its response will be discarded
    /// on arrival. Must be called from within a tokio runtime.
    pub fn render(&mut self, name: &str) -> RequestToken {
        self.latest = self.latest.next();
        let token = self.latest;
        self.pending = Some(name.to_string());
        debug!("requesting row '{name}' as {token}");

        let fetch = self.source.fetch_row(self.context.analysis, name);
        let responses = self.responses.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            let result = fetch.await;
            // receiver gone means the app is shutting down
            let _ = responses.send(RowResponse {
                token,
                name,
                result,
            });
        });
        token
    }

    /// Re-issue the request for the variable on screen (or in flight)
    pub fn refresh(&mut self) -> Option<RequestToken> {
        let name = self
            .pending
            .clone()
            .or_else(|| self.model.as_ref().map(|m| m.selected.clone()))?;
        Some(self.render(&name))
    }

    /// Apply a fetch result; only the latest request may change the chart
    pub fn apply(&mut self, response: RowResponse) -> ApplyOutcome {
        if response.token != self.latest {
            warn!(
                "discarding stale response {} for '{}' (latest is {})",
                response.token, response.name, self.latest
            );
            return ApplyOutcome::Stale;
        }
        self.pending = None;

        let catalog = &self.context.catalog;
        let laid_out = response.result.and_then(|row| {
            let mut entries = pair_entries(catalog, &row, &response.name)?;
            order_entries(&mut entries, catalog.sort_vector());
            Ok(entries)
        });

        match laid_out {
            Ok(entries) => {
                debug!("rendering '{}' with {} entries", response.name, entries.len());
                self.model = Some(ChartModel {
                    selected: response.name,
                    entries,
                });
                self.hover = None;
                self.scroll = 0;
                ApplyOutcome::Rendered
            }
            Err(err) => {
                self.sink.report(&err);
                ApplyOutcome::Failed
            }
        }
    }

    pub fn model(&self) -> Option<&ChartModel> {
        self.model.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn latest_token(&self) -> RequestToken {
        self.latest
    }

    pub fn hovered(&self) -> Option<&DisplayEntry> {
        let index = self.hover?;
        self.model.as_ref()?.entries.get(index)
    }

    /// Tooltip lines for the hovered entry: name, then value with two decimals
    pub fn tooltip(&self) -> Option<(String, String)> {
        self.hovered()
            .map(|e| (e.name.clone(), format_value(e.value)))
    }

    pub fn set_hover(&mut self, index: Option<usize>) {
        let count = self.model.as_ref().map_or(0, |m| m.entries.len());
        self.hover = index.filter(|i| *i < count);
    }

    /// Layout of the current entries for a plot area of the given size
    pub fn geometry(&self, width: u16, height: u16) -> Option<ChartGeometry> {
        self.model.as_ref().map(|m| {
            ChartGeometry::compute(&m.entries, width as f64, height as f64, &self.config)
        })
    }

    fn move_hover(&mut self, delta: isize) {
        let count = self.model.as_ref().map_or(0, |m| m.entries.len());
        if count == 0 {
            return;
        }
        let next = match self.hover {
            Some(i) => i.saturating_add_signed(delta).min(count - 1),
            None if delta < 0 => count - 1,
            None => 0,
        };
        self.hover = Some(next);
    }

    /// Keep the hovered band inside the scrolled window
    fn follow_hover(&mut self, geometry: &ChartGeometry, inner: Rect) {
        let max_scroll = (geometry.width - inner.width as f64).max(0.0) as u16;
        if let Some(bar) = self.hover.and_then(|i| geometry.bars.get(i)) {
            let (start, end) = column_span(bar.x, bar.width);
            let axis = geometry.axis_width as i64;
            let scroll = self.scroll as i64;
            if start < axis + scroll {
                self.scroll = (start - axis).max(0) as u16;
            } else if end > scroll + inner.width as i64 {
                self.scroll = (end - inner.width as i64).max(0) as u16;
            }
        }
        self.scroll = self.scroll.min(max_scroll);
    }

    fn title(&self) -> String {
        let mut title = match &self.model {
            Some(model) => format!("Correlations: {}", model.selected),
            None => "Correlations".to_string(),
        };
        if let Some(name) = &self.pending {
            title.push_str(&format!(" (loading {name}…)"));
        }
        title
    }
}

/// Rows covered by a vertical span, at least one row for a non-empty span
fn row_span(y: f64, height: f64) -> (i64, i64) {
    let start = y.round() as i64;
    let mut end = (y + height).round() as i64;
    if height > 0.0 && end <= start {
        end = start + 1;
    }
    (start, end)
}

/// Writes chart-coordinate cells into the inner area, scrolling the plot
/// region and clipping against the pinned axis
struct Canvas<'a> {
    buf: &'a mut Buffer,
    inner: Rect,
    axis_width: i64,
    scroll: i64,
}

impl Canvas<'_> {
    fn put_pinned(&mut self, x: i64, y: i64, symbol: &str, style: Style) {
        if x < 0 || y < 0 || x >= self.inner.width as i64 || y >= self.inner.height as i64 {
            return;
        }
        let position = Position::new(self.inner.x + x as u16, self.inner.y + y as u16);
        if let Some(cell) = self.buf.cell_mut(position) {
            cell.set_symbol(symbol).set_style(style);
        }
    }

    fn put_scrolled(&mut self, x: i64, y: i64, symbol: &str, style: Style) {
        let screen_x = x - self.scroll;
        if screen_x < self.axis_width {
            return;
        }
        self.put_pinned(screen_x, y, symbol, style);
    }
}

impl Component for CorrelationChart {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::MoveLeft => self.move_hover(-1),
            Action::MoveRight => self.move_hover(1),
            Action::GoToTop => self.set_hover(Some(0)),
            Action::GoToBottom => {
                let count = self.model.as_ref().map_or(0, |m| m.entries.len());
                self.set_hover(count.checked_sub(1));
            }
            Action::Cancel if self.hover.is_some() => self.hover = None,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<bool> {
        let inner = self.last_inner;
        let inside = inner.contains(Position::new(mouse.column, mouse.row));
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                let band = if inside {
                    self.last_geometry.as_ref().and_then(|geometry| {
                        let local_x = (mouse.column - inner.x) as f64;
                        if local_x < geometry.axis_width {
                            return None;
                        }
                        let x = local_x + self.scroll as f64;
                        let y = (mouse.row - inner.y) as f64;
                        geometry.band_at(x, y)
                    })
                } else {
                    None
                };
                let changed = band != self.hover;
                self.hover = band;
                Ok(changed || inside)
            }
            MouseEventKind::ScrollDown | MouseEventKind::ScrollRight if inside => {
                self.scroll = self.scroll.saturating_add(WHEEL_STEP);
                Ok(true)
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollLeft if inside => {
                self.scroll = self.scroll.saturating_sub(WHEEL_STEP);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .border_style(self.theme.border_style(self.focused));
        let inner = block.inner(area);
        frame.render_widget(Clear, area);
        frame.render_widget(block, area);
        self.last_inner = inner;

        let Some(geometry) = self.geometry(inner.width, inner.height) else {
            self.last_geometry = None;
            let hint = Paragraph::new("Select a variable to plot its correlations")
                .style(self.theme.muted_style());
            frame.render_widget(hint, inner);
            return;
        };
        self.follow_hover(&geometry, inner);

        let theme = self.theme.clone();
        let hover = self.hover;
        let entries = self
            .model
            .as_ref()
            .map(|m| m.entries.as_slice())
            .unwrap_or_default();
        let mut canvas = Canvas {
            buf: frame.buffer_mut(),
            inner,
            axis_width: geometry.axis_width as i64,
            scroll: self.scroll as i64,
        };
        let plot_top = geometry.plot_top.round() as i64;
        let plot_bottom = (geometry.plot_top + geometry.plot_height).round() as i64;
        let clamp_row = |y: f64| (y.floor() as i64).clamp(plot_top, (plot_bottom - 1).max(plot_top));

        // Reference lines at -1, 0, +1
        for line in &geometry.lines {
            let row = clamp_row(line.y);
            let (x1, x2) = (line.x1.round() as i64, line.x2.round() as i64);
            for x in x1..x2 {
                let on = match line.style {
                    LineStyle::Solid => true,
                    LineStyle::Dashed => ((x - x1) / 2) % 2 == 0,
                };
                if on {
                    canvas.put_scrolled(x, row, "─", theme.reference_line_style());
                }
            }
        }

        // Bars, one color per sign bucket
        for (bar, _) in geometry.bars.iter().zip(entries) {
            let style = Style::default().fg(theme.bar_color(bar.sign));
            let (x1, x2) = column_span(bar.x, bar.width);
            let (y1, y2) = row_span(bar.y, bar.height);
            for y in y1.max(plot_top)..y2.min(plot_bottom) {
                for x in x1..x2 {
                    canvas.put_scrolled(x, y, "█", style);
                }
            }
        }

        // Bottom categorical axis with vertical labels
        let label_style = theme.axis_style();
        for x in geometry.axis_width as i64..geometry.width.round() as i64 {
            canvas.put_scrolled(x, plot_bottom, "─", label_style);
        }
        for (index, (bar, entry)) in geometry.bars.iter().zip(entries).enumerate() {
            let (x, _) = column_span(bar.x, bar.width);
            let style = if hover == Some(index) {
                label_style.add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                label_style
            };
            canvas.put_scrolled(x, plot_bottom, "┬", label_style);
            let mut buf = [0u8; 4];
            for (offset, ch) in entry.name.chars().enumerate() {
                let row = plot_bottom + 1 + offset as i64;
                if row >= inner.height as i64 {
                    break;
                }
                canvas.put_scrolled(x, row, ch.encode_utf8(&mut buf), style);
            }
        }

        // Left value axis, pinned while the plot scrolls
        let axis_x = geometry.axis_width as i64 - 1;
        for y in plot_top..plot_bottom {
            canvas.put_pinned(axis_x, y, "│", label_style);
        }
        for tick in &geometry.ticks {
            let row = clamp_row(geometry.plot_top + geometry.value_scale.map(*tick));
            let label = format!("{:>width$.1}", tick, width = axis_x.max(0) as usize);
            for (offset, ch) in label.chars().enumerate() {
                let mut buf = [0u8; 4];
                canvas.put_pinned(offset as i64, row, ch.encode_utf8(&mut buf), label_style);
            }
            canvas.put_pinned(axis_x, row, "┤", label_style);
        }

        // Tooltip for the hovered band
        if let (Some(index), Some((name, value))) = (hover, self.tooltip()) {
            if let Some(bar) = geometry.bars.get(index) {
                let width = (name.chars().count().max(value.len()) as u16 + 2).min(inner.width);
                let height = 4u16.min(inner.height);
                let anchor = bar.x + bar.width - self.scroll as f64;
                let max_x = inner.width.saturating_sub(width);
                let x = (anchor.max(0.0) as u16).min(max_x);
                let y = (geometry.plot_top as u16).min(inner.height.saturating_sub(height));
                let popup = Rect::new(inner.x + x, inner.y + y, width, height);
                let content = vec![Line::from(name), Line::from(value)];
                frame.render_widget(Clear, popup);
                frame.render_widget(
                    Paragraph::new(content)
                        .style(theme.tooltip_style())
                        .block(Block::default().borders(Borders::ALL).style(theme.tooltip_style())),
                    popup,
                );
            }
        }

        self.last_geometry = Some(geometry);
    }

    fn supported_actions(&self) -> &[Action] {
        &self.supported_actions
    }

    fn name(&self) -> &str {
        "CorrelationChart"
    }
}

impl Focusable for CorrelationChart {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.hover = None;
        }
    }
}
