use crate::tui::action::Action;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Maps KeyEvents to Actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(rename = "bindings")]
    bindings_list: Vec<KeyBinding>,

    #[serde(skip)]
    bindings_map: HashMap<KeyPattern, Action>,
}

/// Single keybinding entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub action: Action,
}

/// Pattern for matching key events
///
/// Character keys carry their case in the code and never the SHIFT
/// modifier, so "G" matches a shifted g regardless of terminal quirks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPattern {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings_list = vec![
            // Navigation
            KeyBinding::new("Up", Action::MoveUp),
            KeyBinding::new("Down", Action::MoveDown),
            KeyBinding::new("Left", Action::MoveLeft),
            KeyBinding::new("Right", Action::MoveRight),
            KeyBinding::new("k", Action::MoveUp),
            KeyBinding::new("j", Action::MoveDown),
            KeyBinding::new("h", Action::MoveLeft),
            KeyBinding::new("l", Action::MoveRight),
            KeyBinding::new("PageUp", Action::PageUp),
            KeyBinding::new("PageDown", Action::PageDown),
            KeyBinding::new("Home", Action::GoToTop),
            KeyBinding::new("End", Action::GoToBottom),
            KeyBinding::new("g", Action::GoToTop),
            KeyBinding::new("G", Action::GoToBottom),
            // Panes
            KeyBinding::new("Tab", Action::NextPane),
            KeyBinding::new("BackTab", Action::PrevPane),
            // Filter
            KeyBinding::new("/", Action::FocusFilter),
            KeyBinding::new("Ctrl+f", Action::FocusFilter),
            KeyBinding::new("Ctrl+u", Action::ClearFilter),
            // Chart
            KeyBinding::new("r", Action::Refresh),
            KeyBinding::new("F5", Action::Refresh),
            KeyBinding::new("m", Action::DisplayHeatmap),
            KeyBinding::new("F2", Action::DisplayHeatmap),
            // Application
            KeyBinding::new("q", Action::Quit),
            KeyBinding::new("Ctrl+c", Action::Quit),
            KeyBinding::new("Esc", Action::Cancel),
            KeyBinding::new("Enter", Action::Confirm),
        ];

        let bindings_map = Self::build_map(&bindings_list);

        Self {
            bindings_list,
            bindings_map,
        }
    }
}

impl KeyBindings {
    /// Build hashmap from bindings list
    fn build_map(bindings: &[KeyBinding]) -> HashMap<KeyPattern, Action> {
        bindings
            .iter()
            .filter_map(|b| {
                KeyPattern::from_string(&b.key)
                    .ok()
                    .map(|pattern| (pattern, b.action))
            })
            .collect()
    }

    /// Get action for key event
    pub fn get_action(&self, key: &KeyEvent) -> Option<Action> {
        let pattern = KeyPattern::from_event(key);
        self.bindings_map.get(&pattern).copied()
    }

    /// Load from a JSON (or JSON5, comments allowed) file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut bindings: KeyBindings = json5::from_str(&content)?;
        bindings.bindings_map = Self::build_map(&bindings.bindings_list);
        Ok(bindings)
    }

    /// Get all bindings for an action
    pub fn get_keys_for_action(&self, action: Action) -> Vec<String> {
        self.bindings_list
            .iter()
            .filter(|b| b.action == action)
            .map(|b| b.key.clone())
            .collect()
    }

    /// Short "key: description" hints for the status line
    pub fn hints(&self, actions: &[Action]) -> String {
        actions
            .iter()
            .map(|action| match self.get_keys_for_action(*action).first() {
                Some(key) => format!("{key}: {}", action.description()),
                None => action.description().to_string(),
            })
            .collect::<Vec<_>>()
            .join("  ")
    }

    /// Check for actions that don't have any keybindings
    pub fn get_unbound_actions(&self) -> Vec<(Action, &'static str)> {
        let bound_actions: HashSet<Action> = self.bindings_list.iter().map(|b| b.action).collect();

        Action::all()
            .into_iter()
            .filter(|action| !bound_actions.contains(action))
            .map(|action| (action, action.description()))
            .collect()
    }

    /// Validate bindings and return warnings
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let mut seen_keys: HashMap<String, Action> = HashMap::new();
        for binding in &self.bindings_list {
            if let Some(existing_action) = seen_keys.get(&binding.key) {
                warnings.push(format!(
                    "Duplicate key '{}': bound to both {:?} and {:?}",
                    binding.key, existing_action, binding.action
                ));
            } else {
                seen_keys.insert(binding.key.clone(), binding.action);
            }
        }

        let unbound = self.get_unbound_actions();
        if !unbound.is_empty() {
            warnings.push(format!(
                "{} action(s) have no keybindings: {}",
                unbound.len(),
                unbound
                    .iter()
                    .map(|(action, _)| format!("{:?}", action))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        for binding in &self.bindings_list {
            if KeyPattern::from_string(&binding.key).is_err() {
                warnings.push(format!(
                    "Invalid key pattern '{}' for action {:?}",
                    binding.key, binding.action
                ));
            }
        }

        warnings
    }
}

impl KeyBinding {
    pub fn new(key: &str, action: Action) -> Self {
        Self {
            key: key.to_string(),
            action,
        }
    }
}

impl KeyPattern {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        let mut modifiers = event.modifiers;
        if matches!(event.code, KeyCode::Char(_) | KeyCode::BackTab) {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        Self {
            code: event.code,
            modifiers,
        }
    }

    /// Parse from string (e.g., "Ctrl+c", "G", "F5")
    pub fn from_string(s: &str) -> Result<Self, String> {
        // "+" alone is a key, not a separator
        let parts: Vec<&str> = if s == "+" {
            vec!["+"]
        } else {
            s.split('+').collect()
        };

        let mut modifiers = KeyModifiers::empty();
        for part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return Err(format!("Unknown modifier: {}", part)),
            }
        }
        let key_part = parts[parts.len() - 1];

        let mut chars = key_part.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(ch), None) => {
                // Character case lives in the code; Ctrl combos are reported lowercase
                modifiers.remove(KeyModifiers::SHIFT);
                if modifiers.contains(KeyModifiers::CONTROL) {
                    KeyCode::Char(ch.to_ascii_lowercase())
                } else {
                    KeyCode::Char(ch)
                }
            }
            (None, _) => return Err("Empty key".to_string()),
            _ => match key_part.to_lowercase().as_str() {
                "up" => KeyCode::Up,
                "down" => KeyCode::Down,
                "left" => KeyCode::Left,
                "right" => KeyCode::Right,
                "pageup" | "pgup" => KeyCode::PageUp,
                "pagedown" | "pgdown" | "pgdn" => KeyCode::PageDown,
                "home" => KeyCode::Home,
                "end" => KeyCode::End,
                "tab" => KeyCode::Tab,
                "backtab" => KeyCode::BackTab,
                "enter" | "return" => KeyCode::Enter,
                "esc" | "escape" => KeyCode::Esc,
                "backspace" => KeyCode::Backspace,
                "delete" | "del" => KeyCode::Delete,
                "space" => KeyCode::Char(' '),
                f if f.starts_with('f') => match f[1..].parse::<u8>() {
                    Ok(n) if (1..=12).contains(&n) => KeyCode::F(n),
                    _ => return Err(format!("Invalid function key: {}", key_part)),
                },
                _ => return Err(format!("Unknown key: {}", key_part)),
            },
        };

        if code == KeyCode::BackTab {
            modifiers.remove(KeyModifiers::SHIFT);
        }

        Ok(Self { code, modifiers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pattern_parsing() {
        assert!(KeyPattern::from_string("Ctrl+c").is_ok());
        assert!(KeyPattern::from_string("a").is_ok());
        assert!(KeyPattern::from_string("F5").is_ok());
        assert!(KeyPattern::from_string("BackTab").is_ok());
        assert!(KeyPattern::from_string("Hyper+x").is_err());
        assert!(KeyPattern::from_string("F13").is_err());
    }

    #[test]
    fn test_shifted_characters_match() {
        let bindings = KeyBindings::default();
        let shifted_g = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(bindings.get_action(&shifted_g), Some(Action::GoToBottom));

        let plain_g = KeyEvent::new(KeyCode::Char('g'), KeyModifiers::NONE);
        assert_eq!(bindings.get_action(&plain_g), Some(Action::GoToTop));

        let back_tab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(bindings.get_action(&back_tab), Some(Action::PrevPane));
    }

    #[test]
    fn test_ctrl_bindings() {
        let bindings = KeyBindings::default();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(bindings.get_action(&ctrl_c), Some(Action::Quit));
    }

    #[test]
    fn test_default_bindings_are_valid() {
        let bindings = KeyBindings::default();
        let warnings = bindings.validate();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn test_hints() {
        let bindings = KeyBindings::default();
        let hints = bindings.hints(&[Action::DisplayHeatmap, Action::Quit]);
        assert_eq!(hints, "m: Display individual heatmap  q: Quit application");
    }

    #[test]
    fn test_save_and_load() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keybindings.json");

        let bindings = KeyBindings::default();
        std::fs::write(&path, serde_json::to_string_pretty(&bindings).unwrap()).unwrap();

        let loaded = KeyBindings::load_from_file(&path).unwrap();
        assert_eq!(bindings.bindings_list.len(), loaded.bindings_list.len());

        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(loaded.get_action(&enter), Some(Action::Confirm));
    }

    #[test]
    fn test_load_json5_with_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{
                // quit on x only
                bindings: [{ key: "x", action: "Quit" }],
            }"#,
        )
        .unwrap();

        let loaded = KeyBindings::load_from_file(file.path()).unwrap();
        let x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(loaded.get_action(&x), Some(Action::Quit));
        assert_eq!(loaded.get_action(&q), None);
        assert!(!loaded.validate().is_empty());
    }
}
