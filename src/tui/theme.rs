use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

/// Named theme selectable from the config file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

/// A theme defines the color scheme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    // General UI colors
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub muted: Color,

    // List colors
    pub selected_fg: Color,
    pub selected_bg: Color,

    // Chart colors: exactly two bar buckets
    pub positive_bar: Color,
    pub negative_bar: Color,
    pub axis: Color,
    pub reference_line: Color,
    pub tooltip_fg: Color,
    pub tooltip_bg: Color,

    // Status/feedback colors
    pub error: Color,
    pub info: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }

    /// Default dark theme
    pub fn dark() -> Self {
        Self {
            name: "Default Dark".to_string(),
            background: Color::Reset,
            foreground: Color::Gray,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            muted: Color::DarkGray,
            selected_fg: Color::Black,
            selected_bg: Color::Cyan,
            positive_bar: Color::Red,
            negative_bar: Color::Blue,
            axis: Color::Gray,
            reference_line: Color::White,
            tooltip_fg: Color::Black,
            tooltip_bg: Color::Yellow,
            error: Color::Red,
            info: Color::Blue,
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            name: "Light".to_string(),
            background: Color::White,
            foreground: Color::Black,
            border: Color::Gray,
            border_focused: Color::Blue,
            muted: Color::Gray,
            selected_fg: Color::White,
            selected_bg: Color::Blue,
            positive_bar: Color::Red,
            negative_bar: Color::Blue,
            axis: Color::Black,
            reference_line: Color::Black,
            tooltip_fg: Color::White,
            tooltip_bg: Color::Black,
            error: Color::Red,
            info: Color::Blue,
        }
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .fg(self.selected_fg)
            .bg(self.selected_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focused)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn bar_color(&self, sign: crate::core::Sign) -> Color {
        match sign {
            crate::core::Sign::NonNegative => self.positive_bar,
            crate::core::Sign::Negative => self.negative_bar,
        }
    }

    pub fn axis_style(&self) -> Style {
        Style::default().fg(self.axis)
    }

    pub fn reference_line_style(&self) -> Style {
        Style::default().fg(self.reference_line)
    }

    pub fn tooltip_style(&self) -> Style {
        Style::default().fg(self.tooltip_fg).bg(self.tooltip_bg)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.info)
    }
}
