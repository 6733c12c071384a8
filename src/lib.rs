pub mod config;
pub mod core;
pub mod logging;
pub mod services;
pub mod tui;

// Re-export commonly used types
pub use core::{AnalysisContext, AnalysisId, CorrError, VariableCatalog};
pub use services::{ErrorSink, HttpVectorSource, MatrixFileSource, StatusErrorSink, VectorSource};
pub use tui::{Action, App};
