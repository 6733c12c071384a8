use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while loading a catalog or rendering a correlation row
#[derive(Debug, Error)]
pub enum CorrError {
    /// Network or I/O failure on either fetch contract
    #[error("failed to fetch {target}: {source}")]
    Fetch {
        target: String,
        #[source]
        source: BoxError,
    },

    /// The payload arrived but could not be interpreted
    #[error("failed to decode {target}: {reason}")]
    Decode { target: String, reason: String },

    /// Fetched row length does not match the catalog column count
    #[error("row for '{row}' has {actual} values, catalog has {expected} columns")]
    CatalogMismatch {
        row: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("duplicate variable name '{0}' in catalog")]
    DuplicateName(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

impl CorrError {
    pub fn fetch(target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Fetch {
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn decode(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            target: target.into(),
            reason: reason.into(),
        }
    }
}
