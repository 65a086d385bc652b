//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Route log lines to stdout or an append-only log file
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - RUST_LOG overrides the configured level
//! - File output goes through a non-blocking appender so slow disks never
//!   stall the relay path

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    Open {
        path: String,
        source: tracing_appender::rolling::InitError,
    },

    #[error("invalid log file path {0}")]
    Path(String),

    #[error("failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init_logging(config: &ObservabilityConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(path) = config.log_file.as_deref() else {
        let registry = tracing_subscriber::registry().with(filter);
        if config.json {
            registry.with(fmt::layer().json()).try_init()?;
        } else {
            registry.with(fmt::layer()).try_init()?;
        }
        return Ok(None);
    };

    let appender = open_appender(path)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .try_init()?;
    }
    Ok(Some(guard))
}

fn open_appender(path: &Path) -> Result<RollingFileAppender, LoggingError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::Path(path.display().to_string()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .map_err(|source| LoggingError::Open {
            path: path.display().to_string(),
            source,
        })
}
