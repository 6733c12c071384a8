pub mod chart;
pub mod drill_down;
pub mod heatmap;
pub mod selection_list;

pub use chart::{ApplyOutcome, ChartModel, CorrelationChart, RowResponse};
pub use drill_down::{
    DrillDown, DrillDownFactory, DrillDownLauncher, DrillDownRequest, DrillDownSurfaces,
    ModalState,
};
pub use heatmap::RowHeatmap;
pub use selection_list::{ListEvent, ListFocus, SelectionList};
