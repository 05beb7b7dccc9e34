//! Conversation log: ordered, role-tagged message history.
//!
//! The log is always seeded with an assistant greeting; "clear" resets
//! back to exactly that state.

use serde::{Deserialize, Serialize};

/// Greeting shown when a session starts or history is cleared.
pub const GREETING: &str = "Upload a PDF file from the sidebar to get started.";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Assistant,
    User,
}

impl Role {
    /// Label used in prompts and the transcript ("User" / "Assistant").
    pub fn label(self) -> &'static str {
        match self {
            Role::Assistant => "Assistant",
            Role::User => "User",
        }
    }
}

/// A single turn in the conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only conversation log, seeded with the assistant greeting.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::seeded()
    }
}

impl ConversationLog {
    /// A fresh log containing only the seeded greeting.
    pub fn seeded() -> Self {
        Self {
            messages: vec![Message::assistant(GREETING)],
        }
    }

    /// Reset to the seeded state.
    pub fn clear(&mut self) {
        self.messages = vec![Message::assistant(GREETING)];
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Roll back a pending turn: remove the trailing message if it is a
    /// user message. Used when inference fails before an answer lands.
    pub fn pop_pending_user(&mut self) -> Option<Message> {
        if self.messages.last().map(|m| m.role) == Some(Role::User) {
            self.messages.pop()
        } else {
            None
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_log_has_greeting() {
        let log = ConversationLog::seeded();
        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0].role, Role::Assistant);
        assert_eq!(log.messages()[0].content, GREETING);
    }

    #[test]
    fn test_log_never_empty_after_init() {
        let log = ConversationLog::default();
        assert!(!log.is_empty());
    }

    #[test]
    fn test_clear_resets_to_single_greeting() {
        let mut log = ConversationLog::seeded();
        log.push_user("What is this?");
        log.push_assistant("A document.");
        log.clear();
        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0].content, GREETING);
    }

    #[test]
    fn test_push_preserves_order() {
        let mut log = ConversationLog::seeded();
        log.push_user("first");
        log.push_assistant("second");
        let roles: Vec<Role> = log.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }

    #[test]
    fn test_pop_pending_user_removes_trailing_user() {
        let mut log = ConversationLog::seeded();
        log.push_user("doomed question");
        let popped = log.pop_pending_user();
        assert_eq!(popped.unwrap().content, "doomed question");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_pop_pending_user_noop_after_assistant() {
        let mut log = ConversationLog::seeded();
        log.push_user("q");
        log.push_assistant("a");
        assert!(log.pop_pending_user().is_none());
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::User.label(), "User");
        assert_eq!(Role::Assistant.label(), "Assistant");
    }
}
