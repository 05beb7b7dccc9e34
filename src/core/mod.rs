//! Domain logic: documents, conversation, prompts, inference, credentials.

pub mod conversation;
pub mod credentials;
pub mod document;
pub mod llm;
pub mod logging;
pub mod prompt;
pub mod session;
