/// Events flowing through the Elm-architecture event loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic tick for notification TTLs.
    Tick,
    /// Raw terminal input (keyboard/mouse).
    Input(crossterm::event::Event),
    /// Streaming answer fragment received.
    LlmToken(String),
    /// Answer complete.
    LlmDone,
    /// Inference failed; the turn is abandoned.
    LlmError(String),
    /// A resolved action to execute.
    Action(Action),
    /// Notification to display to the user.
    Notification(Notification),
    /// Request to quit the application.
    Quit,
}

/// High-level actions dispatched by the input mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Navigation
    FocusChat,
    FocusSidebar,
    TabNext,
    TabPrev,

    // Modals
    ShowHelp,
    CloseHelp,

    // Session
    ToggleTheme,
    ClearChat,

    // Application
    Quit,
}

/// Which panel has input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    Sidebar,
    Chat,
}

impl Focus {
    pub const ALL: [Focus; 2] = [Focus::Sidebar, Focus::Chat];

    pub fn label(self) -> &'static str {
        match self {
            Focus::Sidebar => "Sidebar",
            Focus::Chat => "Chat",
        }
    }

    pub fn next(self) -> Focus {
        let idx = Focus::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Focus::ALL[(idx + 1) % Focus::ALL.len()]
    }

    pub fn prev(self) -> Focus {
        let idx = Focus::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Focus::ALL[(idx + Focus::ALL.len() - 1) % Focus::ALL.len()]
    }
}

/// Notification level for the overlay system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A timed notification shown in the overlay.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub level: NotificationLevel,
    /// Ticks remaining before auto-dismiss.
    pub ttl_ticks: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_next_cycles() {
        let mut f = Focus::Sidebar;
        for _ in 0..Focus::ALL.len() {
            f = f.next();
        }
        assert_eq!(f, Focus::Sidebar);
    }

    #[test]
    fn test_focus_prev_inverts_next() {
        for f in Focus::ALL {
            assert_eq!(f.next().prev(), f);
        }
    }

    #[test]
    fn test_focus_labels_nonempty() {
        for f in Focus::ALL {
            assert!(!f.label().is_empty());
        }
    }
}
