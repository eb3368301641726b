//! Tracing setup: stderr plus a daily rolling file under the data directory.

use std::fs;
use std::path::Path;

use chrono::{Duration, Local, NaiveDate};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Prefix of the rolling log files, e.g. `pom.log.2024-01-02`.
pub const LOG_FILE_PREFIX: &str = "pom.log";

/// Installs the global subscriber.
///
/// `-v` sets stderr to `debug`; otherwise `RUST_LOG` decides. The log file
/// always records `info` and above (`debug` with `-v`). The returned guard
/// must be held until exit so buffered lines get flushed.
pub fn init(verbose: bool, log_dir: &Path, retention_days: u32) -> Option<WorkerGuard> {
    let stderr_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    let (file_layer, guard) = match fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let level = if verbose { "debug" } else { "info" };
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(level));
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("warning: cannot create log directory {}: {e}", log_dir.display());
            (None, None)
        }
    };

    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if guard.is_some() {
        let today = Local::now().date_naive();
        prune_old_logs(log_dir, today, retention_days);
    }
    guard
}

/// Date suffix of a rolling log file name.
fn log_file_date(name: &str) -> Option<NaiveDate> {
    let suffix = name.strip_prefix(LOG_FILE_PREFIX)?.strip_prefix('.')?;
    NaiveDate::parse_from_str(suffix, "%Y-%m-%d").ok()
}

/// Removes log files dated more than `retention_days` before `today`.
/// Returns how many were removed.
pub fn prune_old_logs(log_dir: &Path, today: NaiveDate, retention_days: u32) -> usize {
    let cutoff = today - Duration::days(i64::from(retention_days));
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %log_dir.display(), error = %e, "cannot list log directory");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(date) = log_file_date(&name.to_string_lossy()) else {
            continue;
        };
        if date >= cutoff {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                removed += 1;
                tracing::debug!(path = %entry.path().display(), "removed old log file");
            }
            Err(e) => {
                tracing::warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "failed to remove old log file"
                );
            }
        }
    }
    removed
}
