use crate::core::CorrError;
use std::sync::Mutex;
use tracing::error;

/// Single collaborator through which every I/O failure is reported
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &CorrError);
}

#[derive(Debug, Default)]
struct SinkState {
    last: Option<String>,
    count: usize,
}

/// Error sink that logs through tracing and keeps the latest message for
/// the status bar
#[derive(Debug, Default)]
pub struct StatusErrorSink {
    state: Mutex<SinkState>,
}

impl StatusErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Message of the most recent report, if any
    pub fn last_message(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.last.clone())
    }

    /// Total number of reports received
    pub fn report_count(&self) -> usize {
        self.state.lock().map(|s| s.count).unwrap_or(0)
    }

    /// Dismiss the status message (the count is kept)
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.last = None;
        }
    }
}

impl ErrorSink for StatusErrorSink {
    fn report(&self, err: &CorrError) {
        error!("{err}");
        if let Ok(mut state) = self.state.lock() {
            state.last = Some(err.to_string());
            state.count += 1;
        }
    }
}
