use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::etl::{BoxError, ETLError};

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Installs a global `tracing` subscriber for pipeline logs.
///
/// `RUST_LOG` wins when set, otherwise `log_level` is used. Fails if a
/// global subscriber is already installed.
pub fn init(log_level: &str) -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .with_target(false)
        .try_init()
}

/// Like [`init`], and also appends every event to `log_file`, creating its
/// parent directories.
///
/// File writes happen on a background thread. Keep the returned guard alive
/// for as long as logs should be written; dropping it flushes the file.
pub fn init_with_file(log_level: &str, log_file: impl AsRef<Path>) -> Result<WorkerGuard, BoxError> {
    let log_file = log_file.as_ref();
    let file_name = log_file.file_name().ok_or_else(|| {
        ETLError::Configuration(format!("log file path has no file name: {}", log_file.display()))
    })?;
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory)?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));

    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_target(false).with_ansi(false).with_writer(writer))
        .try_init()?;

    Ok(guard)
}
