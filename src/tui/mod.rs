pub mod action;
pub mod app;
pub mod component;
pub mod components;
pub mod keybindings;
pub mod theme;

pub use action::Action;
pub use app::{App, Pane};
pub use component::{Component, Focusable};
pub use components::{CorrelationChart, DrillDownLauncher, SelectionList};
pub use keybindings::{KeyBinding, KeyBindings, KeyPattern};
pub use theme::{Theme, ThemeName};
