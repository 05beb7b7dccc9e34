//! PaperChat - chat with your PDF documents (TUI Edition)
//!
//! Core library providing PDF text extraction, conversation state,
//! prompt assembly, and streaming LLM inference for the terminal UI.

pub mod config;
pub mod core;
pub mod tui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
