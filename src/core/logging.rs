//! File-only logging for TUI mode.
//!
//! Ratatui owns the terminal, so there is no stdout layer: all logs go
//! to a daily-rolling JSON file under the platform data directory.

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging system for TUI mode.
///
/// Sets up a daily-rolling JSON file logger and redirects standard
/// `log` crate events to `tracing`.
///
/// Returns a `WorkerGuard` which must be kept alive for the duration of
/// the application to ensure buffered logs are flushed on shutdown.
pub fn init_tui(data_dir: &std::path::Path) -> WorkerGuard {
    let log_dir = data_dir.join("logs");

    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "paperchat.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter);

    // No stdout layer; the TUI owns the terminal
    tracing_subscriber::registry().with(file_layer).init();

    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize LogTracer: {}", e);
    }

    guard
}

/// Default log directory root (used when no config override is present).
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("paperchat"))
        .unwrap_or_else(|| PathBuf::from("data"))
}
