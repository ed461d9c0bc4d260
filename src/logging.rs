//! Tracing subscriber assembly.
//!
//! The library only emits through `tracing` macros. Installing a subscriber is
//! up to the binary, which builds one from the `logging` section of its
//! [`DrillConfig`](crate::DrillConfig).

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{DrillError, Result};

/// Keeps the background file writer alive; drop it last.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Stdout fmt layer behind the configured filter, plus a daily rolling file
/// when `file_enabled` is set. The guard is `Some` exactly when a file is
/// written.
pub fn build_subscriber(config: &LoggingConfig) -> Result<(BoxedSubscriber, Option<FileLogGuard>)> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| DrillError::Config(format!("invalid log filter {:?}: {e}", config.level)))?;

    let (file_layer, guard) = if config.file_enabled {
        std::fs::create_dir_all(&config.dir)?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(config.file_prefix.as_str())
            .build(&config.dir)
            .map_err(|e| DrillError::Config(format!("cannot log to {}: {e}", config.dir)))?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true);
        (Some(layer), Some(FileLogGuard { _guard: guard }))
    } else {
        (None, None)
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer);
    Ok((Box::new(subscriber), guard))
}
