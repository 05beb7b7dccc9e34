//! Chat view: transcript rendering, question input, streaming state.
//!
//! The view owns the in-flight answer buffer while tokens stream in;
//! the app loop commits or abandons the turn on completion/failure so
//! the conversation log never holds a partial answer.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;
use tokio::task::JoinHandle;

use crate::core::conversation::Role;
use crate::core::session::Session;
use crate::tui::theme::Theme;
use crate::tui::widgets::input_buffer::InputBuffer;

/// Marker appended to the streaming line while tokens arrive.
const STREAM_CURSOR: &str = "▍";

/// Outcome of a key event handled by the chat view.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatResult {
    /// Key consumed, no app-level effect.
    Consumed,
    /// Question submitted for inference.
    Ask(String),
    /// Cancel the in-flight stream.
    Cancel,
}

/// Vim-ish input modes for the question box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Insert,
}

/// Chat view state.
pub struct ChatState {
    input: InputBuffer,
    pub mode: InputMode,
    scroll_offset: u16,
    auto_scroll: bool,
    streaming: Option<String>,
    stream_task: Option<JoinHandle<()>>,
    last_error: Option<String>,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            input: InputBuffer::new(),
            mode: InputMode::Normal,
            scroll_offset: 0,
            auto_scroll: true,
            streaming: None,
            stream_task: None,
            last_error: None,
        }
    }

    // ── Streaming lifecycle ─────────────────────────────────────────────

    pub fn is_streaming(&self) -> bool {
        self.streaming.is_some()
    }

    /// Begin receiving an answer; `task` forwards stream events into the
    /// app event channel and is aborted on cancel.
    pub fn begin_stream(&mut self, task: JoinHandle<()>) {
        self.streaming = Some(String::new());
        self.stream_task = Some(task);
        self.last_error = None;
        self.auto_scroll = true;
    }

    pub fn append_token(&mut self, token: &str) {
        if let Some(buf) = self.streaming.as_mut() {
            buf.push_str(token);
        }
    }

    /// Finish the stream, returning the accumulated answer.
    pub fn finish_stream(&mut self) -> String {
        self.stream_task = None;
        self.streaming.take().unwrap_or_default()
    }

    /// Drop the in-flight answer after a failure or cancellation. The
    /// partial text is discarded, never committed.
    pub fn fail_stream(&mut self, error: Option<String>) {
        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
        self.streaming = None;
        self.last_error = error;
    }

    // ── Input handling ──────────────────────────────────────────────────

    /// Handle a key event while the chat has focus.
    pub fn handle_key(&mut self, key: KeyEvent, session: &Session) -> ChatResult {
        match self.mode {
            InputMode::Insert => self.handle_insert_key(key, session),
            InputMode::Normal => self.handle_normal_key(key, session),
        }
    }

    fn handle_insert_key(&mut self, key: KeyEvent, session: &Session) -> ChatResult {
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                ChatResult::Consumed
            }
            KeyCode::Enter => {
                // Submitting while a stream is live cancels it and asks anew
                if !session.can_ask() || self.input.is_empty() {
                    ChatResult::Consumed
                } else {
                    ChatResult::Ask(self.input.take().trim().to_string())
                }
            }
            KeyCode::Char(c) => {
                self.input.insert_char(c);
                ChatResult::Consumed
            }
            KeyCode::Backspace => {
                self.input.backspace();
                ChatResult::Consumed
            }
            KeyCode::Delete => {
                self.input.delete();
                ChatResult::Consumed
            }
            KeyCode::Left => {
                self.input.move_left();
                ChatResult::Consumed
            }
            KeyCode::Right => {
                self.input.move_right();
                ChatResult::Consumed
            }
            KeyCode::Home => {
                self.input.move_home();
                ChatResult::Consumed
            }
            KeyCode::End => {
                self.input.move_end();
                ChatResult::Consumed
            }
            _ => ChatResult::Consumed,
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent, session: &Session) -> ChatResult {
        match key.code {
            // Input stays disabled until a document with text is loaded
            KeyCode::Char('i') | KeyCode::Char('a') if session.can_ask() => {
                self.mode = InputMode::Insert;
                ChatResult::Consumed
            }
            KeyCode::Esc if self.is_streaming() => ChatResult::Cancel,
            KeyCode::Up | KeyCode::Char('k') => {
                self.auto_scroll = false;
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                ChatResult::Consumed
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
                ChatResult::Consumed
            }
            KeyCode::PageUp => {
                self.auto_scroll = false;
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
                ChatResult::Consumed
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_add(10);
                ChatResult::Consumed
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.auto_scroll = true;
                ChatResult::Consumed
            }
            _ => ChatResult::Consumed,
        }
    }

    // ── Rendering ───────────────────────────────────────────────────────

    pub fn render(
        &mut self,
        frame: &mut Frame,
        transcript_area: Rect,
        input_area: Rect,
        theme: &Theme,
        session: &Session,
        focused: bool,
    ) {
        self.render_transcript(frame, transcript_area, theme, session, focused);
        self.render_input(frame, input_area, theme, session, focused);
    }

    fn render_transcript(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        session: &Session,
        focused: bool,
    ) {
        let block = if focused {
            theme.block_focused("Conversation")
        } else {
            theme.block_default("Conversation")
        };
        let inner = block.inner(area);

        let mut lines: Vec<Line> = Vec::new();
        for msg in session.log().messages() {
            let label_style = match msg.role {
                Role::Assistant => theme.title(),
                Role::User => Style::default()
                    .fg(theme.info)
                    .add_modifier(ratatui::style::Modifier::BOLD),
            };
            lines.push(Line::from(Span::styled(
                format!("{}:", msg.role.label()),
                label_style,
            )));
            for text_line in msg.content.lines() {
                lines.push(Line::from(Span::styled(
                    text_line.to_string(),
                    Style::default().fg(theme.text),
                )));
            }
            lines.push(Line::default());
        }

        if let Some(partial) = &self.streaming {
            lines.push(Line::from(Span::styled("Assistant:", theme.title())));
            let mut partial_lines = partial.lines().peekable();
            if partial.is_empty() {
                lines.push(Line::from(Span::styled(STREAM_CURSOR, theme.muted())));
            }
            while let Some(text_line) = partial_lines.next() {
                let is_last = partial_lines.peek().is_none();
                let mut spans = vec![Span::styled(
                    text_line.to_string(),
                    Style::default().fg(theme.text),
                )];
                if is_last {
                    spans.push(Span::styled(STREAM_CURSOR, theme.muted()));
                }
                lines.push(Line::from(spans));
            }
        } else if let Some(err) = &self.last_error {
            lines.push(Line::from(Span::styled(
                format!("✗ {err}"),
                Style::default().fg(theme.error),
            )));
        }

        // Wrapped height is unknown before render; clamp against the raw
        // line count, which only overshoots when lines wrap.
        let total = lines.len() as u16;
        let max_offset = total.saturating_sub(inner.height);
        if self.auto_scroll {
            self.scroll_offset = max_offset;
        } else {
            self.scroll_offset = self.scroll_offset.min(max_offset);
            if self.scroll_offset == max_offset {
                self.auto_scroll = true;
            }
        }

        frame.render_widget(
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((self.scroll_offset, 0)),
            area,
        );
    }

    fn render_input(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        session: &Session,
        focused: bool,
    ) {
        let (title, style) = if !session.can_ask() {
            ("Load a PDF to ask questions", theme.dim())
        } else if self.is_streaming() {
            ("Answering… (Esc cancels)", theme.muted())
        } else if self.mode == InputMode::Insert {
            ("Your question (Enter sends)", Style::default().fg(theme.text))
        } else {
            ("Your question (i to type)", theme.muted())
        };

        let block = if focused && self.mode == InputMode::Insert && session.can_ask() {
            theme.block_focused(title)
        } else {
            theme.block_default(title)
        };
        let inner = block.inner(area);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                self.input.text().to_string(),
                style,
            )))
            .block(block),
            area,
        );

        if focused && self.mode == InputMode::Insert && session.can_ask() {
            let x = inner.x
                + self.input.text()[..self.input.cursor_position()]
                    .chars()
                    .count() as u16;
            frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), inner.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Result as DocResult;
    use crate::core::document::TextExtractor;
    use crate::core::session::ThemeMode;
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};
    use std::io::Write;
    use std::path::Path;

    struct FixedExtractor(&'static str);

    impl TextExtractor for FixedExtractor {
        fn extract(&self, _path: &Path) -> DocResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn session_with_doc() -> Session {
        let mut session = Session::new(ThemeMode::Light, Box::new(FixedExtractor("body")));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"bytes")
            .unwrap();
        session.load_document(&path).unwrap();
        session
    }

    fn session_without_doc() -> Session {
        Session::new(ThemeMode::Light, Box::new(FixedExtractor("")))
    }

    #[test]
    fn test_submit_requires_document() {
        let mut chat = ChatState::new();
        let session = session_without_doc();
        chat.mode = InputMode::Insert;
        chat.handle_key(key(KeyCode::Char('q')), &session);
        assert_eq!(chat.handle_key(key(KeyCode::Enter), &session), ChatResult::Consumed);
        assert_eq!(chat.input.text(), "q");
    }

    #[test]
    fn test_submit_drains_input() {
        let mut chat = ChatState::new();
        let session = session_with_doc();
        chat.handle_key(key(KeyCode::Char('i')), &session);
        for c in "why?".chars() {
            chat.handle_key(key(KeyCode::Char(c)), &session);
        }
        assert_eq!(
            chat.handle_key(key(KeyCode::Enter), &session),
            ChatResult::Ask("why?".to_string())
        );
        assert!(chat.input.is_empty());
    }

    #[test]
    fn test_submit_while_streaming_still_asks() {
        let mut chat = ChatState::new();
        let session = session_with_doc();
        chat.streaming = Some(String::new());
        chat.mode = InputMode::Insert;
        chat.handle_key(key(KeyCode::Char('q')), &session);
        assert_eq!(
            chat.handle_key(key(KeyCode::Enter), &session),
            ChatResult::Ask("q".to_string())
        );
    }

    #[test]
    fn test_insert_mode_blocked_without_document() {
        let mut chat = ChatState::new();
        let session = session_without_doc();
        chat.handle_key(key(KeyCode::Char('i')), &session);
        assert_eq!(chat.mode, InputMode::Normal);
    }

    #[test]
    fn test_esc_cancels_only_while_streaming() {
        let mut chat = ChatState::new();
        let session = session_with_doc();
        assert_eq!(chat.handle_key(key(KeyCode::Esc), &session), ChatResult::Consumed);
        chat.streaming = Some(String::new());
        assert_eq!(chat.handle_key(key(KeyCode::Esc), &session), ChatResult::Cancel);
    }

    #[test]
    fn test_stream_accumulates_and_finishes() {
        let mut chat = ChatState::new();
        chat.streaming = Some(String::new());
        chat.append_token("Hel");
        chat.append_token("lo");
        assert!(chat.is_streaming());
        assert_eq!(chat.finish_stream(), "Hello");
        assert!(!chat.is_streaming());
    }

    #[test]
    fn test_fail_stream_discards_partial() {
        let mut chat = ChatState::new();
        chat.streaming = Some(String::new());
        chat.append_token("partial");
        chat.fail_stream(Some("boom".to_string()));
        assert!(!chat.is_streaming());
        assert_eq!(chat.last_error.as_deref(), Some("boom"));
        assert_eq!(chat.finish_stream(), "");
    }

    #[test]
    fn test_tokens_after_finish_are_dropped() {
        let mut chat = ChatState::new();
        chat.streaming = Some(String::new());
        chat.finish_stream();
        chat.append_token("late");
        assert_eq!(chat.finish_stream(), "");
    }

    #[test]
    fn test_scroll_keys_disable_auto_scroll() {
        let mut chat = ChatState::new();
        chat.scroll_offset = 5;
        chat.handle_key(key(KeyCode::Up), &session_with_doc());
        assert!(!chat.auto_scroll);
        assert_eq!(chat.scroll_offset, 4);
        chat.handle_key(key(KeyCode::Char('G')), &session_with_doc());
        assert!(chat.auto_scroll);
    }
}
