//! Bundled drill-down: one row of the matrix drawn as a heatmap strip.

use super::drill_down::{DrillDown, DrillDownRequest, DrillDownSurfaces};
use crate::core::layout::format_value;
use crate::core::{AnalysisId, CorrError, CorrelationRow};
use crate::services::{ErrorSink, VectorSource};
use crate::tui::Theme;
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Width of the color swatch, in cells
const SWATCH_WIDTH: usize = 8;

/// Blue at -1, near-white at 0, red at +1
const NEGATIVE: (u8, u8, u8) = (33, 102, 172);
const NEUTRAL: (u8, u8, u8) = (247, 247, 247);
const POSITIVE: (u8, u8, u8) = (178, 24, 43);

/// Diverging color for a correlation; values outside [-1, 1] are clamped
pub fn diverging_color(value: f64) -> Color {
    let value = if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) };
    let (end, t) = if value < 0.0 {
        (NEGATIVE, -value)
    } else {
        (POSITIVE, value)
    };
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Color::Rgb(
        mix(NEUTRAL.0, end.0),
        mix(NEUTRAL.1, end.1),
        mix(NEUTRAL.2, end.2),
    )
}

enum HeatmapState {
    Loading(oneshot::Receiver<Result<CorrelationRow, CorrError>>),
    Ready(Vec<(String, f64)>),
    Failed(String),
}

pub struct RowHeatmap {
    request: DrillDownRequest,
    sink: Arc<dyn ErrorSink>,
    theme: Theme,
    state: HeatmapState,
}

impl RowHeatmap {
    /// Starts fetching the selected row immediately; must be called from
    /// within a tokio runtime
    pub fn new(
        request: DrillDownRequest,
        source: Arc<dyn VectorSource>,
        analysis: AnalysisId,
        sink: Arc<dyn ErrorSink>,
        theme: Theme,
    ) -> Self {
        let (tx, rx) = oneshot::channel();
        let fetch = source.fetch_row(analysis, &request.selected_name);
        tokio::spawn(async move {
            let _ = tx.send(fetch.await);
        });
        Self {
            request,
            sink,
            theme,
            state: HeatmapState::Loading(rx),
        }
    }

    /// Pick up the fetch result if it has arrived
    pub fn poll(&mut self) {
        let HeatmapState::Loading(rx) = &mut self.state else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => Err(CorrError::decode(
                format!("row '{}'", self.request.selected_name),
                "fetch task ended without a result",
            )),
        };
        self.state = match result.and_then(|row| self.cells(row)) {
            Ok(cells) => HeatmapState::Ready(cells),
            Err(err) => {
                self.sink.report(&err);
                HeatmapState::Failed(err.to_string())
            }
        };
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, HeatmapState::Loading(_))
    }

    /// Cells in display order
    pub fn cells_in_order(&self) -> Option<&[(String, f64)]> {
        match &self.state {
            HeatmapState::Ready(cells) => Some(cells),
            _ => None,
        }
    }

    fn cells(&self, row: CorrelationRow) -> Result<Vec<(String, f64)>, CorrError> {
        let names = &self.request.names;
        if row.len() != names.len() {
            return Err(CorrError::CatalogMismatch {
                row: self.request.selected_name.clone(),
                expected: names.len(),
                actual: row.len(),
            });
        }
        let mut indexed: Vec<(usize, f64)> = row.into_iter().enumerate().collect();
        if let Some(sort_vector) = &self.request.sort_vector {
            indexed.sort_by(|a, b| sort_vector.key(a.0).total_cmp(&sort_vector.key(b.0)));
        }
        Ok(indexed
            .into_iter()
            .map(|(i, value)| (names[i].clone(), value))
            .collect())
    }
}

impl DrillDown for RowHeatmap {
    fn render(&mut self, frame: &mut Frame, surfaces: DrillDownSurfaces) {
        self.poll();

        let title = format!(
            "{} (id {}) against {} variables",
            self.request.selected_name,
            self.request.selected_id,
            self.request.names.len()
        );
        frame.render_widget(
            Paragraph::new(title).style(self.theme.info_style()),
            surfaces.title,
        );

        let body = match &self.state {
            HeatmapState::Loading(_) => {
                Paragraph::new("Loading…").style(self.theme.muted_style())
            }
            HeatmapState::Failed(message) => {
                Paragraph::new(message.as_str()).style(self.theme.error_style())
            }
            HeatmapState::Ready(cells) => {
                let label_width = cells
                    .iter()
                    .map(|(name, _)| name.chars().count())
                    .max()
                    .unwrap_or(0);
                let lines: Vec<Line> = cells
                    .iter()
                    .map(|(name, value)| {
                        Line::from(vec![
                            Span::styled(
                                format!("{name:<label_width$} "),
                                self.theme.normal_style(),
                            ),
                            Span::styled(
                                "█".repeat(SWATCH_WIDTH),
                                Style::default().fg(diverging_color(*value)),
                            ),
                            Span::raw(format!(" {:>5}", format_value(*value))),
                        ])
                    })
                    .collect();
                Paragraph::new(lines)
            }
        };
        frame.render_widget(body, surfaces.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CatalogBootstrap, SortVector, VariableId};
    use crate::services::{MatrixFileSource, StatusErrorSink};
    use pretty_assertions::assert_eq;
    use ratatui::{backend::TestBackend, layout::Rect, Terminal};

    fn source() -> Arc<MatrixFileSource> {
        let catalog = CatalogBootstrap {
            col_names: vec![],
            matrix_names: vec!["A".into(), "B".into(), "C".into()],
            matrix_ids: vec![VariableId::new(1), VariableId::new(2), VariableId::new(3)],
            sort_vector: None,
        };
        let matrix = vec![
            vec![1.0, -0.4, 0.8],
            vec![-0.4, 1.0, 0.1],
            vec![0.8, 0.1, 1.0],
        ];
        Arc::new(MatrixFileSource::from_parts(catalog, matrix))
    }

    fn request(name: &str, sort_vector: Option<SortVector>) -> DrillDownRequest {
        DrillDownRequest {
            selected_id: VariableId::new(1),
            names: vec!["A".into(), "B".into(), "C".into()],
            ids: vec![VariableId::new(1), VariableId::new(2), VariableId::new(3)],
            selected_name: name.into(),
            sort_vector,
        }
    }

    async fn loaded(heatmap: &mut RowHeatmap) {
        for _ in 0..10 {
            heatmap.poll();
            if !heatmap.is_loading() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("heatmap never finished loading");
    }

    #[test]
    fn test_diverging_color_endpoints() {
        assert_eq!(diverging_color(1.0), Color::Rgb(178, 24, 43));
        assert_eq!(diverging_color(-1.0), Color::Rgb(33, 102, 172));
        assert_eq!(diverging_color(0.0), Color::Rgb(247, 247, 247));
        assert_eq!(diverging_color(3.0), diverging_color(1.0));
    }

    #[tokio::test]
    async fn test_catalog_order_without_sort_vector() {
        let sink = Arc::new(StatusErrorSink::new());
        let mut heatmap = RowHeatmap::new(
            request("A", None),
            source(),
            AnalysisId::new(1),
            sink.clone(),
            Theme::default(),
        );
        loaded(&mut heatmap).await;

        let cells = heatmap.cells_in_order().unwrap();
        assert_eq!(
            cells.to_vec(),
            vec![("A".to_string(), 1.0), ("B".to_string(), -0.4), ("C".to_string(), 0.8)]
        );
        assert_eq!(sink.report_count(), 0);
    }

    #[tokio::test]
    async fn test_sort_vector_orders_cells() {
        let sink = Arc::new(StatusErrorSink::new());
        let mut heatmap = RowHeatmap::new(
            request("B", Some(SortVector::new(vec![2.0, 0.0, 1.0]))),
            source(),
            AnalysisId::new(1),
            sink,
            Theme::default(),
        );
        loaded(&mut heatmap).await;

        let names: Vec<&str> = heatmap
            .cells_in_order()
            .unwrap()
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported() {
        let sink = Arc::new(StatusErrorSink::new());
        let mut heatmap = RowHeatmap::new(
            request("missing", None),
            source(),
            AnalysisId::new(1),
            sink.clone(),
            Theme::default(),
        );
        loaded(&mut heatmap).await;

        assert!(heatmap.cells_in_order().is_none());
        assert_eq!(sink.report_count(), 1);
    }

    #[tokio::test]
    async fn test_render_draws_swatches() {
        let sink = Arc::new(StatusErrorSink::new());
        let mut heatmap = RowHeatmap::new(
            request("A", None),
            source(),
            AnalysisId::new(1),
            sink,
            Theme::default(),
        );
        loaded(&mut heatmap).await;

        let mut terminal = Terminal::new(TestBackend::new(30, 5)).unwrap();
        terminal
            .draw(|f| {
                let surfaces = DrillDownSurfaces {
                    title: Rect::new(0, 0, 30, 1),
                    body: Rect::new(0, 1, 30, 4),
                };
                heatmap.render(f, surfaces);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        let red = buffer
            .content()
            .iter()
            .filter(|c| c.symbol() == "█" && c.fg == diverging_color(1.0))
            .count();
        assert_eq!(red, SWATCH_WIDTH);
    }
}
