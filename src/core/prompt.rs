//! Deterministic prompt assembly.
//!
//! The prompt layout is fixed: system instruction, the first 5000
//! characters of document text, the full conversation so far, then the
//! new question with a trailing "Assistant:" cue.

use crate::core::conversation::ConversationLog;

/// System instruction prepended to every prompt.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant. You do not respond as 'User' or \
pretend to be 'User'. You only respond once as 'Assistant'.";

/// Hard character cap on the document context section.
pub const CONTEXT_CHAR_LIMIT: usize = 5000;

/// Truncate document text to the context limit on a character boundary.
fn context_section(document_text: &str) -> &str {
    match document_text.char_indices().nth(CONTEXT_CHAR_LIMIT) {
        Some((idx, _)) => &document_text[..idx],
        None => document_text,
    }
}

/// Build the full inference prompt for a new question.
///
/// `log` is the history up to but not including `question`; the question
/// is appended as the final user turn.
pub fn build_prompt(document_text: &str, log: &ConversationLog, question: &str) -> String {
    let history = log
        .messages()
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{SYSTEM_PROMPT}\n\nHere is the PDF context:\n\n{}\n\nConversation so far:\n{}\n\nUser: {}\n\nAssistant:",
        context_section(document_text),
        history,
        question,
    )
}
