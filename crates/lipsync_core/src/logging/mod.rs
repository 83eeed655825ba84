//! Logging infrastructure for batch runs.
//!
//! This module provides:
//! - Global `tracing` setup (stderr, optionally a rolling file)
//! - A per-run logger with file + callback output
//! - Compact mode with progress filtering
//! - Tail buffer of inference output for failure diagnosis
//!
//! # Example
//!
//! ```no_run
//! use lipsync_core::logging::{RunLogger, LogConfig};
//!
//! let logger = RunLogger::new("batch", ".logs", LogConfig::default(), None).unwrap();
//!
//! logger.phase("Planning");
//! logger.command("python -m scripts.inference ...");
//! logger.progress(50);
//! logger.success("Generated host_line01_20240101_120000.mp4");
//! ```

mod run_logger;
mod types;

use std::path::Path;

pub use run_logger::RunLogger;
pub use types::{LogCallback, LogConfig, LogLevel};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build the env filter: RUST_LOG wins, otherwise the given default level.
fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_str()))
}

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(env_filter(default_level))
        .init();
}

/// Initialize global tracing with stderr output plus a daily log file.
///
/// The returned guard must be kept alive for the file writer to flush.
pub fn init_tracing_with_file(default_level: LogLevel, logs_dir: &Path) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(logs_dir, "lipsync-batch.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(env_filter(default_level))
        .init();

    guard
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// Run `f` with a thread-local subscriber at `level` and return what it logged.
#[cfg(test)]
pub(crate) fn capture_tracing<R>(level: tracing::Level, f: impl FnOnce() -> R) -> (R, String) {
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let output = String::from_utf8_lossy(&captured.0.lock()).into_owned();
    (result, output)
}
