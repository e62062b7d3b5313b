//! Centralized theme module for TUI color constants and styles

use ratatui::prelude::*;

/// Which palette to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Auto,
    Dark,
    Light,
}

/// Complete color palette for the TUI
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Progress gauge
    pub gauge_filled: Color,
    pub gauge_empty: Color,

    // Question area
    pub category_style: Style,
    pub question_style: Style,
    pub choice_cursor: Style,
    pub choice_answered: Color,
    pub choice_key: Color,

    // General colors
    pub muted: Color,
    pub title_color: Color,

    // Status bar colors
    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_success: Color,
    pub flash_error: Color,

    // Popup overlay colors
    pub popup_border: Color,
    pub popup_title: Style,
    pub popup_bg: Color,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            gauge_filled: Color::Green,
            gauge_empty: Color::Indexed(238),
            category_style: Style::new().fg(Color::Cyan).bold(),
            question_style: Style::new().fg(Color::White).bold(),
            choice_cursor: Style::new().reversed(),
            choice_answered: Color::Green,
            choice_key: Color::Cyan,
            muted: Color::Gray,
            title_color: Color::Cyan,
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_success: Color::Green,
            flash_error: Color::Red,
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
            popup_bg: Color::Indexed(234),
        }
    }

    pub fn light() -> Self {
        Self {
            gauge_filled: Color::Rgb(0, 128, 0),
            gauge_empty: Color::Indexed(252),
            category_style: Style::new().fg(Color::Blue).bold(),
            question_style: Style::new().fg(Color::Black).bold(),
            choice_cursor: Style::new().reversed(),
            choice_answered: Color::Rgb(0, 128, 0),
            choice_key: Color::Blue,
            muted: Color::DarkGray,
            title_color: Color::Blue,
            status_bar_bg: Color::Indexed(254),
            status_key_color: Color::Blue,
            flash_success: Color::Rgb(0, 128, 0),
            flash_error: Color::Red,
            popup_border: Color::Blue,
            popup_title: Style::new().fg(Color::Blue).bold(),
            popup_bg: Color::Indexed(255),
        }
    }
}

/// Pick a palette. `Auto` asks the terminal for its background luminance and
/// falls back to dark when the terminal doesn't answer.
pub fn resolve_theme(theme: Theme) -> ThemeColors {
    match theme {
        Theme::Dark => ThemeColors::dark(),
        Theme::Light => ThemeColors::light(),
        Theme::Auto => match terminal_light::luma() {
            Ok(luma) if luma > 0.6 => ThemeColors::light(),
            Ok(_) => ThemeColors::dark(),
            Err(e) => {
                tracing::debug!(error = %e, "terminal background unknown, using dark theme");
                ThemeColors::dark()
            }
        },
    }
}
