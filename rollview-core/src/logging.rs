//! Logging infrastructure for rollview
//!
//! Replay logs go to `~/.local/state/rollview/rollview.log*` (XDG state dir),
//! one file per day. With `[logging] stderr = true` (what `rollview --verbose`
//! sets) the same events are echoed to stderr in a compact form, so stdout
//! stays reserved for replay output.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_FILE_PREFIX: &str = "rollview.log";

/// Initialize the logging system
///
/// `RUST_LOG` overrides the configured level.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    let file_appender = rolling_appender(&log_dir, config.max_files)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let stderr_layer = config.stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .compact()
    });

    tracing_subscriber::registry()
        .with(build_filter(&config.level))
        .with(file_layer)
        .with(stderr_layer)
        .init();

    tracing::info!(
        log_file = %log_file_path().display(),
        level = %config.level,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

fn rolling_appender(log_dir: &Path, max_files: usize) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(max_files.max(1))
        .build(log_dir)
        .map_err(|e| Error::Config(format!("failed to open log file: {}", e)))
}

/// `RUST_LOG` wins; otherwise the configured level, falling back to `info`
/// when it is not a valid directive.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging for tests (logs to stdout)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any pending log writes.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Returns the log file path (today's file carries a date suffix)
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}
