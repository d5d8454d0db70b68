//! Tracing setup: daily-rolling log files under the app data directory.
//!
//! The terminal belongs to the UI, so nothing is ever written to stdout or
//! stderr by the subscriber.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::paths;

const DEFAULT_FILTER: &str = "mdnote=info";

/// Keeps the non-blocking writer alive; drop it last so buffered lines flush.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    log_dir: PathBuf,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Installs the global subscriber. Returns `None` when no log directory can
/// be created or a subscriber is already installed; the app runs unlogged.
pub fn init() -> Option<LoggingGuard> {
    let log_dir = paths::ensure_log_dir()
        .or_else(|_| -> std::io::Result<PathBuf> {
            let dir = std::env::temp_dir().join(paths::APP_NAME).join("logs");
            std::fs::create_dir_all(&dir)?;
            Ok(dir)
        })
        .ok()?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "mdnote.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    tracing::info!(log_dir = %log_dir.display(), "tracing initialized");

    Some(LoggingGuard {
        _guard: guard,
        log_dir,
    })
}
