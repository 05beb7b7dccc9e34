//! Application state and the main event loop.
//!
//! Single Elm-style loop: terminal input, timer ticks, and inference
//! stream events all arrive as `AppEvent`s and mutate one `AppState`,
//! which is redrawn after every event.

use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph};
use ratatui::{Frame, Terminal};

use crate::config::AppConfig;
use crate::core::document::{LoadStatus, PdfExtractor};
use crate::core::llm::GenerationParams;
use crate::core::session::{Session, ThemeMode};

use super::events::{Action, AppEvent, Focus, Notification, NotificationLevel};
use super::layout::AppLayout;
use super::services::Services;
use super::theme::Theme;
use super::views::chat::{ChatResult, ChatState, InputMode};
use super::views::sidebar::{SidebarResult, SidebarState};

/// Ticks a notification stays visible (5s at the default tick rate).
const NOTIFICATION_TTL_TICKS: u32 = 100;
/// At most this many notifications stack in the overlay.
const MAX_NOTIFICATIONS: usize = 3;

/// Top-level application state.
pub struct AppState {
    session: Session,
    services: Services,
    sidebar: SidebarState,
    chat: ChatState,
    focus: Focus,
    show_help: bool,
    notifications: Vec<Notification>,
    next_notification_id: u64,
    should_quit: bool,
}

/// Run the TUI until the user quits.
pub async fn run<B: ratatui::backend::Backend<Error = io::Error>>(
    terminal: &mut Terminal<B>,
    config: &AppConfig,
) -> io::Result<()> {
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    let services = Services::init(config, event_tx);
    let session = Session::new(
        ThemeMode::from_name(&config.tui.theme),
        Box::new(PdfExtractor),
    );
    let mut app = AppState::new(session, services);

    let mut tick = tokio::time::interval(Duration::from_millis(config.tui.tick_rate_ms));
    let mut input_events = EventStream::new();

    loop {
        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            _ = tick.tick() => app.handle_event(AppEvent::Tick),
            Some(Ok(ev)) = input_events.next() => app.handle_event(AppEvent::Input(ev)),
            Some(ev) = event_rx.recv() => app.handle_event(ev),
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

impl AppState {
    pub fn new(session: Session, services: Services) -> Self {
        Self {
            session,
            services,
            sidebar: SidebarState::new(),
            chat: ChatState::new(),
            focus: Focus::Sidebar,
            show_help: false,
            notifications: Vec::new(),
            next_notification_id: 0,
            should_quit: false,
        }
    }

    // ── Event handling ──────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick => self.on_tick(),
            AppEvent::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.on_key(key)
            }
            AppEvent::Input(_) => {}
            AppEvent::LlmToken(token) => self.chat.append_token(&token),
            // Done/Error events already queued when the user cancelled
            // refer to an abandoned turn; dropping them keeps the log
            // unchanged.
            AppEvent::LlmDone if self.chat.is_streaming() => {
                let answer = self.chat.finish_stream();
                self.session.commit_answer(answer);
            }
            AppEvent::LlmError(message) if self.chat.is_streaming() => {
                log::warn!("Inference failed: {message}");
                self.chat.fail_stream(Some(message.clone()));
                self.session.abandon_turn();
                self.push_notification(message, NotificationLevel::Error);
            }
            AppEvent::LlmDone | AppEvent::LlmError(_) => {}
            AppEvent::Action(action) => self.run_action(action),
            AppEvent::Notification(n) => {
                self.push_notification(n.message, n.level);
            }
            AppEvent::Quit => self.should_quit = true,
        }
    }

    fn on_tick(&mut self) {
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.show_help {
            self.show_help = false;
            return;
        }

        // Global bindings that work regardless of focus
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.run_action(Action::Quit);
            return;
        }

        let chat_editing = self.focus == Focus::Chat && self.chat.mode == InputMode::Insert;
        if !chat_editing {
            match key.code {
                KeyCode::Tab => {
                    self.run_action(Action::TabNext);
                    return;
                }
                KeyCode::BackTab => {
                    self.run_action(Action::TabPrev);
                    return;
                }
                KeyCode::F(1) => {
                    self.run_action(Action::ShowHelp);
                    return;
                }
                _ => {}
            }
        }

        match self.focus {
            Focus::Chat => {
                if !chat_editing {
                    match key.code {
                        KeyCode::Char('q') => {
                            self.run_action(Action::Quit);
                            return;
                        }
                        KeyCode::Char('?') => {
                            self.run_action(Action::ShowHelp);
                            return;
                        }
                        _ => {}
                    }
                }
                match self.chat.handle_key(key, &self.session) {
                    ChatResult::Ask(question) => self.start_stream(question),
                    ChatResult::Cancel => self.cancel_stream(),
                    ChatResult::Consumed => {}
                }
            }
            Focus::Sidebar => match self.sidebar.handle_key(key) {
                SidebarResult::SubmitToken(token) => self.submit_token(&token),
                SidebarResult::LoadPdf(path) => self.load_pdf(&path),
                SidebarResult::ClearHistory => self.run_action(Action::ClearChat),
                SidebarResult::ForgetToken => {
                    self.services.clear_token();
                    self.push_notification("API token removed", NotificationLevel::Info);
                }
                SidebarResult::ToggleTheme => self.run_action(Action::ToggleTheme),
                SidebarResult::Consumed => {}
            },
        }
    }

    fn run_action(&mut self, action: Action) {
        match action {
            Action::FocusChat => self.focus = Focus::Chat,
            Action::FocusSidebar => self.focus = Focus::Sidebar,
            Action::TabNext => self.focus = self.focus.next(),
            Action::TabPrev => self.focus = self.focus.prev(),
            Action::ShowHelp => self.show_help = true,
            Action::CloseHelp => self.show_help = false,
            Action::ToggleTheme => self.session.theme = self.session.theme.toggle(),
            Action::ClearChat => {
                if self.chat.is_streaming() {
                    self.cancel_stream();
                }
                self.session.clear_history();
                self.push_notification("Chat history cleared", NotificationLevel::Info);
            }
            Action::Quit => self.should_quit = true,
        }
    }

    // ── Effects ─────────────────────────────────────────────────────────

    fn submit_token(&mut self, token: &str) {
        if self.services.set_token(token) {
            self.push_notification("API token accepted", NotificationLevel::Success);
        } else {
            self.push_notification(
                "Invalid token: expected r8_… with 40 characters",
                NotificationLevel::Error,
            );
        }
    }

    fn load_pdf(&mut self, path: &str) {
        match self.session.load_document(Path::new(path)) {
            Ok(LoadStatus::Extracted { chars }) if chars == 0 => {
                self.sidebar.clear_path();
                self.push_notification(
                    "PDF loaded but no text could be extracted",
                    NotificationLevel::Warning,
                );
            }
            Ok(LoadStatus::Extracted { chars }) => {
                self.sidebar.clear_path();
                self.push_notification(
                    format!("PDF loaded ({chars} chars)"),
                    NotificationLevel::Success,
                );
                self.focus = Focus::Chat;
            }
            Ok(LoadStatus::AlreadyLoaded) => {
                self.push_notification("Document already loaded", NotificationLevel::Info);
            }
            Err(e) => {
                log::warn!("PDF load failed for {path}: {e}");
                self.push_notification(format!("PDF load failed: {e}"), NotificationLevel::Error);
            }
        }
    }

    fn start_stream(&mut self, question: String) {
        if self.chat.is_streaming() {
            self.cancel_stream();
        }
        let client = match self.services.llm() {
            Some(c) => c.clone(),
            None => {
                self.push_notification(
                    "Set a Replicate API token in the sidebar first",
                    NotificationLevel::Error,
                );
                return;
            }
        };

        let prompt = self.session.begin_turn(&question);
        let mut rx = client.stream_generate(prompt, GenerationParams::default());
        let tx = self.services.event_tx.clone();
        let task = tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                match item {
                    Ok(token) => {
                        if tx.send(AppEvent::LlmToken(token)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(AppEvent::LlmError(e.to_string()));
                        return;
                    }
                }
            }
            let _ = tx.send(AppEvent::LlmDone);
        });
        self.chat.begin_stream(task);
    }

    fn cancel_stream(&mut self) {
        self.chat.fail_stream(None);
        self.session.abandon_turn();
        self.push_notification("Generation cancelled", NotificationLevel::Info);
    }

    fn push_notification(&mut self, message: impl Into<String>, level: NotificationLevel) {
        let message = message.into();
        // Refresh instead of stacking duplicates
        if let Some(existing) = self.notifications.iter_mut().find(|n| n.message == message) {
            existing.ttl_ticks = NOTIFICATION_TTL_TICKS;
            return;
        }
        if self.notifications.len() >= MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
        self.next_notification_id += 1;
        self.notifications.push(Notification {
            id: self.next_notification_id,
            message,
            level,
            ttl_ticks: NOTIFICATION_TTL_TICKS,
        });
    }

    // ── Rendering ───────────────────────────────────────────────────────

    pub fn render(&mut self, frame: &mut Frame) {
        let theme = Theme::for_mode(self.session.theme);
        let area = frame.area();

        frame.render_widget(
            ratatui::widgets::Block::default().style(Style::default().bg(theme.bg_base)),
            area,
        );

        let layout = AppLayout::compute(area);

        if let Some(sidebar_area) = layout.sidebar {
            self.sidebar.render(
                frame,
                sidebar_area,
                &theme,
                &self.session,
                &self.services,
                self.focus == Focus::Sidebar,
            );
        }
        self.chat.render(
            frame,
            layout.transcript,
            layout.input,
            &theme,
            &self.session,
            self.focus == Focus::Chat,
        );
        self.render_status_bar(frame, layout.status, &theme);
        self.render_notifications(frame, area, &theme);
        if self.show_help {
            self.render_help(frame, area, &theme);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let hints = if self.focus == Focus::Chat && self.chat.mode == InputMode::Insert {
            "[Enter]:send [Esc]:normal"
        } else if self.chat.is_streaming() {
            "[Esc]:cancel [Tab]:panel [q]:quit"
        } else {
            "[Tab]:panel [i]:type [?]:help [q]:quit"
        };
        let line = Line::from(vec![
            Span::styled(" PaperChat ", theme.brand_badge()),
            Span::raw(" "),
            Span::styled(self.focus.label(), theme.title()),
            Span::raw("  "),
            Span::styled(hints, theme.key_hint()),
        ]);
        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(theme.bg_surface)),
            area,
        );
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        for (i, n) in self.notifications.iter().enumerate() {
            let (prefix, color) = match n.level {
                NotificationLevel::Info => ("ℹ", theme.info),
                NotificationLevel::Success => ("✓", theme.success),
                NotificationLevel::Warning => ("⚠", theme.warning),
                NotificationLevel::Error => ("✗", theme.error),
            };
            let text = format!(" {prefix} {} ", n.message);
            let width = (text.chars().count() as u16).min(area.width);
            let rect = Rect::new(
                area.right().saturating_sub(width + 1),
                area.y + 1 + i as u16,
                width,
                1,
            );
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(Span::styled(
                    text,
                    Style::default().fg(color).bg(theme.bg_surface),
                )),
                rect,
            );
        }
    }

    fn render_help(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let rect = centered_rect(50, 60, area);
        frame.render_widget(Clear, rect);
        let lines = vec![
            Line::from(Span::styled("Keys", theme.title())),
            Line::default(),
            Line::from("Tab / Shift+Tab   switch panel"),
            Line::from("i                 type a question"),
            Line::from("Enter             send / activate"),
            Line::from("Esc               cancel stream / leave insert"),
            Line::from("↑ ↓ PgUp PgDn G   scroll transcript"),
            Line::from("q / Ctrl+C        quit"),
            Line::default(),
            Line::from(Span::styled("Sidebar", theme.title())),
            Line::default(),
            Line::from("↑ ↓               move between fields"),
            Line::from("Enter             submit field / run action"),
            Line::default(),
            Line::from(Span::styled("Press any key to close", theme.muted())),
        ];
        frame.render_widget(
            Paragraph::new(lines)
                .block(theme.block_focused("Help"))
                .style(Style::default().bg(theme.bg_surface)),
            rect,
        );
    }
}

/// Centered rect occupying the given percentages of `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);
    let horizontal = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(vertical[1]);
    horizontal[1]
}
