//! Root layout computation for sidebar + chat + status bar.

use ratatui::layout::{Constraint, Layout, Rect};

/// Width of the sidebar (token/path fields need room).
pub const SIDEBAR_WIDTH: u16 = 34;
/// Hide the sidebar entirely below this terminal width.
pub const HIDE_SIDEBAR_THRESHOLD: u16 = 48;
/// Height of the chat input box (border + one text row + border).
pub const INPUT_HEIGHT: u16 = 3;

/// Computed layout regions for a single frame.
pub struct AppLayout {
    /// Sidebar area (None if hidden on a narrow terminal).
    pub sidebar: Option<Rect>,
    /// Chat transcript area.
    pub transcript: Rect,
    /// Chat input box.
    pub input: Rect,
    /// Status bar (bottom row).
    pub status: Rect,
}

impl AppLayout {
    /// Compute layout regions from the terminal area.
    pub fn compute(area: Rect) -> Self {
        // Split vertically: content rows + status bar
        let rows = Layout::vertical([
            Constraint::Min(1),    // Content (sidebar + chat)
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        let content_area = rows[0];
        let status = rows[1];

        let (sidebar, chat_area) = if area.width < HIDE_SIDEBAR_THRESHOLD {
            (None, content_area)
        } else {
            let cols = Layout::horizontal([
                Constraint::Length(SIDEBAR_WIDTH),
                Constraint::Min(1),
            ])
            .split(content_area);
            (Some(cols[0]), cols[1])
        };

        let chat_rows = Layout::vertical([
            Constraint::Min(1),              // Transcript
            Constraint::Length(INPUT_HEIGHT), // Input box
        ])
        .split(chat_area);

        AppLayout {
            sidebar,
            transcript: chat_rows[0],
            input: chat_rows[1],
            status,
        }
    }
}
