//! Switchable light/dark color theme for the PaperChat TUI.
//!
//! All color constants are RGB truecolor. Views take a `&Theme` instead
//! of using inline `Color::*` literals; the active palette follows the
//! session's `ThemeMode`.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};

use crate::core::session::ThemeMode;

/// Toggle button face shown in the sidebar: the moon invites dark mode,
/// the sun invites light mode.
pub fn toggle_button(mode: ThemeMode) -> &'static str {
    match mode {
        ThemeMode::Light => "🌜",
        ThemeMode::Dark => "🌞",
    }
}

/// Active color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Base background.
    pub bg_base: Color,
    /// Elevated panels, sidebar.
    pub bg_surface: Color,
    /// Primary accent, focused borders, titles.
    pub primary: Color,
    /// Primary text.
    pub text: Color,
    /// Muted text, secondary labels.
    pub text_muted: Color,
    /// Dim text, disabled items.
    pub text_dim: Color,
    /// Semantic colors.
    pub error: Color,
    pub success: Color,
    pub warning: Color,
    pub info: Color,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            bg_base: Color::Rgb(0xFF, 0xFF, 0xFF),
            bg_surface: Color::Rgb(0xF5, 0xF5, 0xF5),
            primary: Color::Rgb(0x62, 0x00, 0xEE),
            text: Color::Rgb(0x00, 0x00, 0x00),
            text_muted: Color::Rgb(0x60, 0x60, 0x60),
            text_dim: Color::Rgb(0xA0, 0xA0, 0xA0),
            error: Color::Rgb(0xB0, 0x00, 0x20),
            success: Color::Rgb(0x2E, 0x7D, 0x32),
            warning: Color::Rgb(0xB2, 0x6A, 0x00),
            info: Color::Rgb(0x15, 0x65, 0xC0),
        }
    }

    pub fn dark() -> Self {
        Self {
            bg_base: Color::Rgb(0x12, 0x12, 0x12),
            bg_surface: Color::Rgb(0x1F, 0x1B, 0x24),
            primary: Color::Rgb(0xBB, 0x86, 0xFC),
            text: Color::Rgb(0xE0, 0xE0, 0xE0),
            text_muted: Color::Rgb(0x90, 0x90, 0x90),
            text_dim: Color::Rgb(0x50, 0x50, 0x50),
            error: Color::Rgb(0xCF, 0x66, 0x79),
            success: Color::Rgb(0x66, 0xBB, 0x6A),
            warning: Color::Rgb(0xFF, 0xA7, 0x26),
            info: Color::Rgb(0x42, 0xA5, 0xF5),
        }
    }

    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }

    // ── Style helpers ───────────────────────────────────────────────────

    /// Primary-colored bold text (titles, active items).
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Focused border style.
    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.primary)
    }

    /// Unfocused border style.
    pub fn border_default(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    /// Muted label text.
    pub fn muted(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    /// Dim text for disabled/faint items.
    pub fn dim(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    /// Key hint style (e.g., "[q]:quit").
    pub fn key_hint(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    /// Status bar brand badge.
    pub fn brand_badge(&self) -> Style {
        Style::default()
            .fg(self.bg_base)
            .bg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    // ── Block builders ──────────────────────────────────────────────────

    /// A bordered block with focused styling.
    pub fn block_focused(&self, title: &str) -> Block<'static> {
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(self.border_focused())
    }

    /// A bordered block with default (unfocused) styling.
    pub fn block_default(&self, title: &str) -> Block<'static> {
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(self.border_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_palette_colors() {
        let t = Theme::light();
        assert_eq!(t.bg_base, Color::Rgb(0xFF, 0xFF, 0xFF));
        assert_eq!(t.primary, Color::Rgb(0x62, 0x00, 0xEE));
        assert_eq!(t.bg_surface, Color::Rgb(0xF5, 0xF5, 0xF5));
    }

    #[test]
    fn test_dark_palette_colors() {
        let t = Theme::dark();
        assert_eq!(t.bg_base, Color::Rgb(0x12, 0x12, 0x12));
        assert_eq!(t.primary, Color::Rgb(0xBB, 0x86, 0xFC));
        assert_eq!(t.text, Color::Rgb(0xE0, 0xE0, 0xE0));
    }

    #[test]
    fn test_for_mode_matches_toggle() {
        assert_eq!(Theme::for_mode(ThemeMode::Light), Theme::light());
        assert_eq!(Theme::for_mode(ThemeMode::Dark), Theme::dark());
    }

    #[test]
    fn test_toggle_button_faces() {
        assert_eq!(toggle_button(ThemeMode::Light), "🌜");
        assert_eq!(toggle_button(ThemeMode::Dark), "🌞");
    }

    #[test]
    fn test_style_helpers_return_non_default() {
        let t = Theme::light();
        assert_ne!(t.title(), Style::default());
        assert_ne!(t.border_focused(), Style::default());
        assert_ne!(t.muted(), Style::default());
    }
}
