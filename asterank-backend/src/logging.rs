use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::Context;
use tokio::task;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Keeps the file writer flushing until dropped
#[allow(dead_code)]
pub struct LoggerGuard(WorkerGuard);

pub fn init_logging(log_dir: impl AsRef<Path>, prefix: &str, level: &str) -> anyhow::Result<LoggerGuard> {
    let log_dir = log_dir.as_ref().to_path_buf();
    let level = normalize_level(level);

    let builder = EnvFilter::builder().with_default_directive(
        level
            .parse()
            .with_context(|| format!("Invalid log directive '{}'", level))?,
    );

    let rust_log = std::env::var("RUST_LOG").unwrap_or_default();
    let console_filter = builder.clone().parse_lossy(&rust_log);
    let file_filter = builder.parse_lossy(&rust_log);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(&log_dir)
        .with_context(|| format!("Failed to create log appender in {}", log_dir.display()))?;
    let (non_blocking, guard) = NonBlocking::new(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(file_filter);
    // stdout carries command results, so console logs go to stderr
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!("Logging at level {}", level);

    start_log_cleanup_task(log_dir, prefix.to_string());

    Ok(LoggerGuard(guard))
}

/// Unknown levels fall back to `info`.
fn normalize_level(level: &str) -> &str {
    if LOG_LEVELS.contains(&level) {
        level
    } else {
        eprintln!("Invalid log level '{}', defaulting to 'info'", level);
        "info"
    }
}

fn start_log_cleanup_task(log_dir: PathBuf, prefix: String) {
    const MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 3);
    const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

    task::spawn(async move {
        loop {
            if let Err(e) = cleanup_old_logs(&log_dir, &prefix, MAX_AGE) {
                tracing::warn!("Failed to delete old log file: {}", e);
            }
            tokio::time::sleep(CLEANUP_INTERVAL).await;
        }
    });
}

fn cleanup_old_logs(log_dir: &Path, prefix: &str, max_age: Duration) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !(file_name.starts_with(prefix) && file_name.ends_with(".log")) {
            continue;
        }
        if let Ok(modified) = fs::metadata(&path)?.modified() {
            if now.duration_since(modified).unwrap_or_default() > max_age {
                fs::remove_file(&path)?;
                tracing::info!("Old log file deleted: {}", file_name);
                removed += 1;
            }
        }
    }
    Ok(removed)
}
