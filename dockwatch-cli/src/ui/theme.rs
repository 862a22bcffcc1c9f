//! Color palette and style helpers for the dashboard

use ratatui::style::{Color, Modifier, Style};

use dockwatch_core::logstream::LineKind;
use dockwatch_core::model::Entity;
use dockwatch_core::timeseries::SeriesColor;

/// Color palette tokens
#[derive(Clone, Debug)]
pub struct Palette {
    /// Panel border color
    pub panel_border: Color,
    /// Primary text color
    pub text: Color,
    /// Dimmed text (secondary info)
    pub text_dim: Color,
    /// Muted text (placeholders, "No Data")
    pub text_muted: Color,
    /// Accent color (titles, focus)
    pub accent: Color,
    /// Running containers
    pub success: Color,
    /// Paused / restarting containers
    pub warn: Color,
    /// Error lines and failed containers
    pub error: Color,
    /// Informational log lines
    pub info: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    /// Key hint text
    pub key_hint: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::dark()
    }
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            panel_border: Color::Rgb(60, 60, 60),
            text: Color::Rgb(212, 212, 212),
            text_dim: Color::Rgb(150, 150, 150),
            text_muted: Color::Rgb(100, 100, 100),
            accent: Color::Rgb(79, 193, 255),
            success: Color::Rgb(78, 201, 176),
            warn: Color::Rgb(220, 180, 100),
            error: Color::Rgb(244, 135, 113),
            info: Color::Rgb(156, 220, 254),
            selection_bg: Color::Rgb(38, 79, 120),
            selection_fg: Color::White,
            key_hint: Color::Rgb(206, 145, 120),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Theme {
    pub palette: Palette,
}

impl Theme {
    /// Terminal color for a chart line
    pub fn series_color(&self, color: Option<SeriesColor>) -> Color {
        match color {
            Some(SeriesColor::Red) => Color::Red,
            Some(SeriesColor::Green) => Color::Green,
            Some(SeriesColor::Yellow) => Color::Yellow,
            Some(SeriesColor::Blue) => Color::Blue,
            Some(SeriesColor::Magenta) => Color::Magenta,
            Some(SeriesColor::Cyan) => Color::Cyan,
            Some(SeriesColor::White) => Color::White,
            Some(SeriesColor::Grey) => Color::Gray,
            None => self.palette.text_muted,
        }
    }

    /// Status column style, keyed off the runtime's free-form status text
    pub fn status_style(&self, entity: &Entity) -> Style {
        let color = if entity.is_placeholder() {
            self.palette.error
        } else if entity.status.starts_with("Up") {
            if entity.status.contains("Paused") {
                self.palette.warn
            } else {
                self.palette.success
            }
        } else if entity.status.starts_with("Restarting") {
            self.palette.warn
        } else {
            self.palette.text_muted
        };
        Style::default().fg(color)
    }

    pub fn log_line_style(&self, kind: LineKind) -> Style {
        let color = match kind {
            LineKind::Output => self.palette.text,
            LineKind::Error => self.palette.error,
            LineKind::Info => self.palette.info,
        };
        Style::default().fg(color)
    }

    pub fn key_hint_style(&self) -> Style {
        Style::default()
            .fg(self.palette.key_hint)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.palette.panel_border)
    }

    pub fn selection_style(&self) -> Style {
        Style::default()
            .bg(self.palette.selection_bg)
            .fg(self.palette.selection_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.palette.text)
    }

    pub fn text_dim_style(&self) -> Style {
        Style::default().fg(self.palette.text_dim)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.palette.accent)
            .add_modifier(Modifier::BOLD)
    }
}

static DEFAULT_THEME: std::sync::OnceLock<Theme> = std::sync::OnceLock::new();

pub fn theme() -> &'static Theme {
    DEFAULT_THEME.get_or_init(Theme::default)
}

/// Shorthands over the global theme
pub mod styles {
    use super::*;

    pub fn series(color: Option<SeriesColor>) -> Style {
        Style::default().fg(theme().series_color(color))
    }

    pub fn status(entity: &Entity) -> Style {
        theme().status_style(entity)
    }

    pub fn log_line(kind: LineKind) -> Style {
        theme().log_line_style(kind)
    }

    pub fn key_hint() -> Style {
        theme().key_hint_style()
    }

    pub fn border() -> Style {
        theme().border_style()
    }

    pub fn selection() -> Style {
        theme().selection_style()
    }

    pub fn text() -> Style {
        theme().text_style()
    }

    pub fn text_dim() -> Style {
        theme().text_dim_style()
    }

    pub fn title() -> Style {
        theme().title_style()
    }
}
