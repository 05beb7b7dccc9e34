//! Sidebar view: credentials, document loading, session controls.
//!
//! The sidebar owns two input fields (API token, PDF path) and two
//! action rows (clear history, theme toggle). Key handling returns a
//! `SidebarResult` so the app loop can run the effects it cannot.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::core::session::Session;
use crate::tui::services::Services;
use crate::tui::theme::{self, Theme};
use crate::tui::widgets::input_buffer::InputBuffer;

/// Outcome of a key event handled by the sidebar.
#[derive(Debug, PartialEq, Eq)]
pub enum SidebarResult {
    /// Key consumed, no app-level effect.
    Consumed,
    /// Token field submitted.
    SubmitToken(String),
    /// PDF path field submitted.
    LoadPdf(String),
    /// Clear-history row activated.
    ClearHistory,
    /// Forget-token row activated.
    ForgetToken,
    /// Theme toggle row activated.
    ToggleTheme,
}

/// Rows the sidebar cursor can land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Token,
    PdfPath,
    ClearHistory,
    ForgetToken,
    ThemeToggle,
}

impl Field {
    const ALL: [Field; 5] = [
        Field::Token,
        Field::PdfPath,
        Field::ClearHistory,
        Field::ForgetToken,
        Field::ThemeToggle,
    ];

    fn next(self) -> Field {
        let idx = Field::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Field::ALL[(idx + 1) % Field::ALL.len()]
    }

    fn prev(self) -> Field {
        let idx = Field::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Field::ALL[(idx + Field::ALL.len() - 1) % Field::ALL.len()]
    }
}

/// Sidebar view state.
pub struct SidebarState {
    token_input: InputBuffer,
    path_input: InputBuffer,
    field: Field,
}

impl Default for SidebarState {
    fn default() -> Self {
        Self::new()
    }
}

impl SidebarState {
    pub fn new() -> Self {
        Self {
            token_input: InputBuffer::new(),
            path_input: InputBuffer::new(),
            field: Field::Token,
        }
    }

    /// Handle a key event while the sidebar has focus.
    pub fn handle_key(&mut self, key: KeyEvent) -> SidebarResult {
        match key.code {
            KeyCode::Down => {
                self.field = self.field.next();
                SidebarResult::Consumed
            }
            KeyCode::Up => {
                self.field = self.field.prev();
                SidebarResult::Consumed
            }
            KeyCode::Enter => self.activate(),
            _ => match self.field {
                Field::Token => {
                    edit_field(&mut self.token_input, key);
                    SidebarResult::Consumed
                }
                Field::PdfPath => {
                    edit_field(&mut self.path_input, key);
                    SidebarResult::Consumed
                }
                _ => SidebarResult::Consumed,
            },
        }
    }

    fn activate(&mut self) -> SidebarResult {
        match self.field {
            Field::Token => {
                if self.token_input.is_empty() {
                    SidebarResult::Consumed
                } else {
                    SidebarResult::SubmitToken(self.token_input.take())
                }
            }
            Field::PdfPath => {
                if self.path_input.is_empty() {
                    SidebarResult::Consumed
                } else {
                    SidebarResult::LoadPdf(self.path_input.text().trim().to_string())
                }
            }
            Field::ClearHistory => SidebarResult::ClearHistory,
            Field::ForgetToken => SidebarResult::ForgetToken,
            Field::ThemeToggle => SidebarResult::ToggleTheme,
        }
    }

    /// Keep the last submitted path visible after a failed load so the
    /// user can fix a typo instead of retyping.
    pub fn clear_path(&mut self) {
        self.path_input.clear();
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        session: &Session,
        services: &Services,
        focused: bool,
    ) {
        let block = if focused {
            theme.block_focused("PaperChat")
        } else {
            theme.block_default("PaperChat")
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(2), // Token label + field
            Constraint::Length(1), // Token status
            Constraint::Length(1), // Spacer
            Constraint::Length(2), // Path label + field
            Constraint::Length(2), // Document status
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Clear history
            Constraint::Length(1), // Forget token
            Constraint::Length(1), // Theme toggle
            Constraint::Min(0),
        ])
        .split(inner);

        self.render_token_field(frame, rows[0], theme, focused);
        frame.render_widget(
            Paragraph::new(token_status_line(services, theme)),
            rows[1],
        );
        self.render_path_field(frame, rows[3], theme, focused);
        frame.render_widget(
            Paragraph::new(document_status_lines(session, theme)),
            rows[4],
        );
        self.render_action(
            frame,
            rows[6],
            theme,
            focused,
            Field::ClearHistory,
            "Clear chat history".to_string(),
        );
        self.render_action(
            frame,
            rows[7],
            theme,
            focused,
            Field::ForgetToken,
            "Forget API token".to_string(),
        );
        self.render_action(
            frame,
            rows[8],
            theme,
            focused,
            Field::ThemeToggle,
            format!("{} Toggle theme", theme::toggle_button(session.theme)),
        );
    }

    fn render_token_field(&self, frame: &mut Frame, area: Rect, theme: &Theme, focused: bool) {
        let active = focused && self.field == Field::Token;
        let label_style = if active { theme.title() } else { theme.muted() };
        let lines = vec![
            Line::from(Span::styled("Replicate API token", label_style)),
            Line::from(field_text(self.token_input.masked(), active, theme)),
        ];
        frame.render_widget(Paragraph::new(lines), area);
        if active {
            let x = area.x + 2 + self.token_input.masked().chars().count() as u16;
            frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y + 1));
        }
    }

    fn render_path_field(&self, frame: &mut Frame, area: Rect, theme: &Theme, focused: bool) {
        let active = focused && self.field == Field::PdfPath;
        let label_style = if active { theme.title() } else { theme.muted() };
        let lines = vec![
            Line::from(Span::styled("PDF path", label_style)),
            Line::from(field_text(self.path_input.text().to_string(), active, theme)),
        ];
        frame.render_widget(Paragraph::new(lines), area);
        if active {
            let x = area.x + 2 + self.path_input.text()[..self.path_input.cursor_position()]
                .chars()
                .count() as u16;
            frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y + 1));
        }
    }

    fn render_action(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        focused: bool,
        field: Field,
        label: String,
    ) {
        let active = focused && self.field == field;
        let style = if active {
            theme.title()
        } else {
            Style::default().fg(theme.text)
        };
        let marker = if active { "▸ " } else { "  " };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(marker, style),
                Span::styled(label, style),
            ])),
            area,
        );
    }
}

fn edit_field(buf: &mut InputBuffer, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) => buf.insert_char(c),
        KeyCode::Backspace => buf.backspace(),
        KeyCode::Delete => buf.delete(),
        KeyCode::Left => buf.move_left(),
        KeyCode::Right => buf.move_right(),
        KeyCode::Home => buf.move_home(),
        KeyCode::End => buf.move_end(),
        _ => {}
    }
}

fn field_text(content: String, active: bool, theme: &Theme) -> Vec<Span<'static>> {
    let style = if active {
        Style::default().fg(theme.text)
    } else {
        theme.dim()
    };
    vec![Span::styled("> ", style), Span::styled(content, style)]
}

fn token_status_line(services: &Services, theme: &Theme) -> Line<'static> {
    match services.token_mask() {
        Some(mask) => Line::from(Span::styled(
            format!("✓ {mask}"),
            Style::default().fg(theme.success),
        )),
        None => Line::from(Span::styled(
            "✗ no valid token",
            Style::default().fg(theme.error),
        )),
    }
}

fn document_status_lines(session: &Session, theme: &Theme) -> Vec<Line<'static>> {
    match session.document() {
        Some(doc) => {
            let chars = doc.text.chars().count();
            let detail = if chars == 0 {
                Span::styled("no extractable text".to_string(), Style::default().fg(theme.warning))
            } else {
                Span::styled(format!("{chars} chars extracted"), theme.muted())
            };
            vec![
                Line::from(Span::styled(
                    format!("📄 {}", doc.name),
                    Style::default().fg(theme.text),
                )),
                Line::from(detail),
            ]
        }
        None => vec![Line::from(Span::styled("No document loaded", theme.dim()))],
    }
}
