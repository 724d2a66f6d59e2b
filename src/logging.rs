//! Tracing setup: compact console output plus a JSON daily log file.

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber.
///
/// The console layer uses the human-readable format; the file layer writes
/// JSON lines to one file per day under `logs/` (or `LOG_DIR`). The returned
/// guard flushes the file writer on drop, so the caller holds it for the
/// life of the process.
pub fn init() -> WorkerGuard {
    let log_dir = std::env::var("LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("logs"));
    let _ = fs::create_dir_all(&log_dir);

    let appender = tracing_appender::rolling::daily(log_dir, "padron-sync.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::from_default_env().add_directive("padron_sync=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();

    guard
}
