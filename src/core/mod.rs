pub mod catalog;
pub mod error;
pub mod layout;
pub mod types;

pub use catalog::{AnalysisContext, CatalogBootstrap, SortVector, VariableCatalog};
pub use error::CorrError;
pub use layout::{ChartConfig, ChartGeometry, DisplayEntry, Sign};
pub use types::*;
