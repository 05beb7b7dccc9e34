//! Per-process session state.
//!
//! One session per process: theme choice, the loaded document, and the
//! conversation log. Reset operations are explicit methods.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::conversation::ConversationLog;
use crate::core::document::{DocumentStore, LoadStatus, LoadedDocument, Result, TextExtractor};
use crate::core::prompt;

/// User-selectable color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggle(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    /// Parse a config string, defaulting to light.
    pub fn from_name(name: &str) -> Self {
        match name {
            "dark" => ThemeMode::Dark,
            _ => ThemeMode::Light,
        }
    }
}

/// Session state: theme, document, conversation.
pub struct Session {
    pub theme: ThemeMode,
    documents: DocumentStore,
    log: ConversationLog,
}

impl Session {
    pub fn new(theme: ThemeMode, extractor: Box<dyn TextExtractor>) -> Self {
        Self {
            theme,
            documents: DocumentStore::new(extractor),
            log: ConversationLog::seeded(),
        }
    }

    // ── Document ────────────────────────────────────────────────────────

    /// Load a PDF; extraction is skipped when the fingerprint matches.
    pub fn load_document(&mut self, path: &Path) -> Result<LoadStatus> {
        self.documents.load(path)
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.documents.current()
    }

    /// Questions are allowed only when document text is non-empty.
    pub fn can_ask(&self) -> bool {
        self.documents.has_text()
    }

    // ── Conversation ────────────────────────────────────────────────────

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Build the inference prompt for `question` from the current
    /// history, then record the question as the pending user turn.
    pub fn begin_turn(&mut self, question: &str) -> String {
        let prompt = prompt::build_prompt(self.documents.text(), &self.log, question);
        self.log.push_user(question);
        prompt
    }

    /// Commit a completed answer to the log.
    pub fn commit_answer(&mut self, answer: impl Into<String>) {
        self.log.push_assistant(answer);
    }

    /// Abandon the in-flight turn: the pending user message is removed
    /// and the log is exactly as before `begin_turn`.
    pub fn abandon_turn(&mut self) {
        self.log.pop_pending_user();
    }

    /// Reset the conversation to the seeded greeting.
    pub fn clear_history(&mut self) {
        self.log.clear();
    }
}
