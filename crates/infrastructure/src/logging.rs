use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

const INFO_FILE: &str = "log_info.log";
const WARN_FILE: &str = "log_warn.log";
const ERROR_FILE: &str = "log_error.log";

/// Keeps the non-blocking log writers alive for the process lifetime.
/// Dropping this flushes and stops the background writer threads.
pub struct LogGuards {
    _guards: [WorkerGuard; 3],
}

/// Sizes of the three severity log files, as reported by `/status`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LogSizes {
    #[serde(rename = "I")]
    pub info: u64,
    #[serde(rename = "W")]
    pub warn: u64,
    #[serde(rename = "E")]
    pub error: u64,
}

/// Installs the tracing subscriber: console output plus one append-only
/// file per severity under `log_path`.
pub fn init(log_path: &str) -> Result<LogGuards> {
    std::fs::create_dir_all(log_path)
        .with_context(|| format!("creating log directory {log_path}"))?;

    let (info_writer, info_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_path, INFO_FILE));
    let (warn_writer, warn_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_path, WARN_FILE));
    let (error_writer, error_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_path, ERROR_FILE));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(info_writer)
                .with_filter(filter_fn(|meta| *meta.level() == Level::INFO)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(warn_writer)
                .with_filter(filter_fn(|meta| *meta.level() == Level::WARN)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(error_writer)
                .with_filter(filter_fn(|meta| *meta.level() == Level::ERROR)),
        )
        .init();

    Ok(LogGuards {
        _guards: [info_guard, warn_guard, error_guard],
    })
}

/// Current sizes of the severity files, scaled the way the status surface
/// reports them.
pub fn log_file_sizes(log_path: &str) -> Result<LogSizes> {
    let size_of = |name: &str| -> Result<u64> {
        let path = Path::new(log_path).join(name);
        let meta = std::fs::metadata(&path)
            .with_context(|| format!("reading log file {}", path.display()))?;
        Ok(meta.len() / 2048)
    };

    Ok(LogSizes {
        info: size_of(INFO_FILE)?,
        warn: size_of(WARN_FILE)?,
        error: size_of(ERROR_FILE)?,
    })
}
