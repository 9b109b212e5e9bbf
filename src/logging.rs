//! File logging for the editor.
//!
//! The terminal belongs to the TUI, so log output always goes to a daily
//! rolling file in the log directory. `RUST_LOG` overrides the default filter.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;

pub const LOG_PREFIX: &str = "media-rename.log";
const DEFAULT_FILTER: &str = "media_rename=info";
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Install the global subscriber. Returns `None` when logging is disabled.
///
/// The guard must be held for the lifetime of the program or buffered
/// lines are lost.
pub fn init(config: &LoggingConfig, dir: &Path) -> io::Result<Option<WorkerGuard>> {
    if !config.enabled {
        return Ok(None);
    }

    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .with(filter)
        .try_init();

    if installed.is_err() {
        // Someone else owns the global subscriber; keep theirs.
        return Ok(None);
    }

    Ok(Some(guard))
}

/// Delete log files older than `retention_days`. Zero keeps everything.
/// Returns how many files were removed.
pub fn prune_old_logs(dir: &Path, retention_days: u32) -> io::Result<usize> {
    if retention_days == 0 || !dir.exists() {
        return Ok(0);
    }

    let max_age = Duration::from_secs(u64::from(retention_days) * SECONDS_PER_DAY);
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(LOG_PREFIX) {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::info!(removed, retention_days, "Pruned old log files");
    }

    Ok(removed)
}
