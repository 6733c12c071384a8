//! Modal drill-down for the selected variable.
//!
//! The launcher owns the modal lifecycle; what is drawn inside it is supplied
//! by a factory so the binary can plug in the bundled heatmap and tests can
//! plug in a recorder.

use crate::core::{AnalysisContext, CorrError, SortVector, VariableId};
use crate::services::ErrorSink;
use crate::tui::{Action, Component, Theme};
use color_eyre::Result;
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block, Borders, Clear},
    Frame,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a drill-down is constructed from
#[derive(Debug, Clone, PartialEq)]
pub struct DrillDownRequest {
    pub selected_id: VariableId,
    pub names: Vec<String>,
    pub ids: Vec<VariableId>,
    pub selected_name: String,
    pub sort_vector: Option<SortVector>,
}

/// Regions of the modal a drill-down may draw into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillDownSurfaces {
    pub title: Rect,
    pub body: Rect,
}

pub trait DrillDown: Send {
    fn render(&mut self, frame: &mut Frame, surfaces: DrillDownSurfaces);
}

pub type DrillDownFactory = Arc<dyn Fn(DrillDownRequest) -> Box<dyn DrillDown> + Send + Sync>;

enum ModalPhase {
    Hidden,
    /// Launched but not yet given a visible area
    Showing(DrillDownRequest),
    Shown(Box<dyn DrillDown>),
}

/// Coarse modal state, for callers that only need to know what is up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Hidden,
    Showing,
    Shown,
}

pub struct DrillDownLauncher {
    context: AnalysisContext,
    factory: DrillDownFactory,
    sink: Arc<dyn ErrorSink>,
    theme: Theme,
    phase: ModalPhase,
    title: String,
    supported_actions: Vec<Action>,
}

impl DrillDownLauncher {
    pub fn new(
        context: AnalysisContext,
        factory: DrillDownFactory,
        sink: Arc<dyn ErrorSink>,
        theme: Theme,
    ) -> Self {
        Self {
            context,
            factory,
            sink,
            theme,
            phase: ModalPhase::Hidden,
            title: String::new(),
            supported_actions: vec![Action::Cancel, Action::Quit],
        }
    }

    /// Open the modal for `name`. Unknown names are reported and leave the
    /// modal as it was.
    pub fn launch(&mut self, name: &str) -> Result<(), CorrError> {
        let catalog = &self.context.catalog;
        let Some(selected_id) = catalog.id_for(name) else {
            let err = CorrError::UnknownVariable(name.to_string());
            self.sink.report(&err);
            return Err(err);
        };
        info!("opening drill-down for '{name}' ({selected_id})");
        let request = DrillDownRequest {
            selected_id,
            names: catalog.names().to_vec(),
            ids: catalog.ids().to_vec(),
            selected_name: name.to_string(),
            sort_vector: catalog.sort_vector().cloned(),
        };
        self.title = format!("Heatmap: {name}");
        self.phase = ModalPhase::Showing(request);
        Ok(())
    }

    /// Close the modal, dropping the drill-down instance
    pub fn close(&mut self) {
        if !matches!(self.phase, ModalPhase::Hidden) {
            debug!("closing drill-down");
        }
        self.phase = ModalPhase::Hidden;
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.phase, ModalPhase::Hidden)
    }

    pub fn state(&self) -> ModalState {
        match self.phase {
            ModalPhase::Hidden => ModalState::Hidden,
            ModalPhase::Showing(_) => ModalState::Showing,
            ModalPhase::Shown(_) => ModalState::Shown,
        }
    }

    /// Centered region covering 80% of `area`
    fn modal_area(area: Rect) -> Rect {
        let [row] = Layout::vertical([Constraint::Percentage(80)])
            .flex(Flex::Center)
            .areas(area);
        let [modal] = Layout::horizontal([Constraint::Percentage(80)])
            .flex(Flex::Center)
            .areas(row);
        modal
    }
}

impl Component for DrillDownLauncher {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        if !self.is_open() {
            return Ok(false);
        }
        match action {
            Action::Cancel | Action::Quit => {
                self.close();
                Ok(true)
            }
            // the modal swallows everything else while open
            _ => Ok(true),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) {
        if !self.is_open() {
            return;
        }
        let modal = Self::modal_area(area);
        frame.render_widget(Clear, modal);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} (Esc to close)", self.title))
            .border_style(self.theme.border_style(true));
        let inner = block.inner(modal);
        frame.render_widget(block, modal);

        if inner.width == 0 || inner.height < 2 {
            return;
        }
        let [title, body] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(inner);
        let surfaces = DrillDownSurfaces { title, body };

        let phase = std::mem::replace(&mut self.phase, ModalPhase::Hidden);
        let mut instance = match phase {
            ModalPhase::Showing(request) => {
                debug!("constructing drill-down in {}x{}", body.width, body.height);
                (self.factory)(request)
            }
            ModalPhase::Shown(instance) => instance,
            ModalPhase::Hidden => return,
        };
        instance.render(frame, surfaces);
        self.phase = ModalPhase::Shown(instance);
    }

    fn supported_actions(&self) -> &[Action] {
        &self.supported_actions
    }

    fn name(&self) -> &str {
        "DrillDownLauncher"
    }
}
