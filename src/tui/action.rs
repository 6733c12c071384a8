use serde::{Deserialize, Serialize};

/// All possible actions in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Action {
    // Navigation
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,

    // Panes
    NextPane,
    PrevPane,

    // Filter
    FocusFilter,
    ClearFilter,

    // Chart
    Refresh,
    DisplayHeatmap,

    // Application
    Quit,
    Confirm,
    Cancel,
}

impl Action {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Action::MoveUp => "Previous variable",
            Action::MoveDown => "Next variable",
            Action::MoveLeft => "Hover previous bar",
            Action::MoveRight => "Hover next bar",
            Action::PageUp => "Page up",
            Action::PageDown => "Page down",
            Action::GoToTop => "First entry",
            Action::GoToBottom => "Last entry",
            Action::NextPane => "Focus next pane",
            Action::PrevPane => "Focus previous pane",
            Action::FocusFilter => "Filter variables",
            Action::ClearFilter => "Clear filter",
            Action::Refresh => "Reload correlations",
            Action::DisplayHeatmap => "Display individual heatmap",
            Action::Quit => "Quit application",
            Action::Confirm => "Confirm",
            Action::Cancel => "Cancel / close",
        }
    }

    /// Get all possible actions (for validation)
    pub fn all() -> Vec<Action> {
        vec![
            Action::MoveUp,
            Action::MoveDown,
            Action::MoveLeft,
            Action::MoveRight,
            Action::PageUp,
            Action::PageDown,
            Action::GoToTop,
            Action::GoToBottom,
            Action::NextPane,
            Action::PrevPane,
            Action::FocusFilter,
            Action::ClearFilter,
            Action::Refresh,
            Action::DisplayHeatmap,
            Action::Quit,
            Action::Confirm,
            Action::Cancel,
        ]
    }
}
