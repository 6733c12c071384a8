pub mod errors;
pub mod source;

pub use errors::{ErrorSink, StatusErrorSink};
pub use source::{load_context, HttpVectorSource, MatrixFileSource, VectorSource};
