use crate::tui::action::Action;
use color_eyre::Result;
use crossterm::event::MouseEvent;
use ratatui::{layout::Rect, Frame};

/// Base trait for all TUI components
///
/// Components handle actions and mouse events, and draw themselves into the
/// area the app assigns them.
pub trait Component {
    /// Handle an action
    ///
    /// Returns Ok(true) if the action was handled and consumed.
    /// Returns Ok(false) if the action should propagate.
    fn handle_action(&mut self, action: Action) -> Result<bool>;

    /// Handle a mouse event in terminal coordinates
    ///
    /// Components hit-test against the area they were last drawn into.
    fn handle_mouse(&mut self, _mouse: MouseEvent) -> Result<bool> {
        Ok(false)
    }

    /// Draw the component within the given area
    fn draw(&mut self, frame: &mut Frame, area: Rect);

    /// Actions this component responds to
    fn supported_actions(&self) -> &[Action];

    /// Component name for logging
    fn name(&self) -> &str;
}

/// Components that can receive keyboard focus
pub trait Focusable: Component {
    fn is_focused(&self) -> bool;

    fn set_focused(&mut self, focused: bool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyModifiers, MouseEventKind};

    struct MockComponent {
        focused: bool,
        actions: Vec<Action>,
    }

    impl Component for MockComponent {
        fn handle_action(&mut self, action: Action) -> Result<bool> {
            Ok(self.supported_actions().contains(&action))
        }

        fn draw(&mut self, _frame: &mut Frame, _area: Rect) {}

        fn supported_actions(&self) -> &[Action] {
            &self.actions
        }

        fn name(&self) -> &str {
            "Mock"
        }
    }

    impl Focusable for MockComponent {
        fn is_focused(&self) -> bool {
            self.focused
        }

        fn set_focused(&mut self, focused: bool) {
            self.focused = focused;
        }
    }

    #[test]
    fn test_action_routing_and_default_mouse() {
        let mut comp = MockComponent {
            focused: false,
            actions: vec![Action::MoveUp],
        };

        assert!(comp.handle_action(Action::MoveUp).unwrap());
        assert!(!comp.handle_action(Action::Quit).unwrap());

        let mouse = MouseEvent {
            kind: MouseEventKind::Moved,
            column: 1,
            row: 1,
            modifiers: KeyModifiers::NONE,
        };
        assert!(!comp.handle_mouse(mouse).unwrap());

        comp.set_focused(true);
        assert!(comp.is_focused());
        assert_eq!(comp.name(), "Mock");
    }
}
