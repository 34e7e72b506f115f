//! Logging setup
//!
//! Installs a `tracing` subscriber for the binary. `RUST_LOG` takes
//! precedence over the configured level.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::error::{AccessControlError, AccessControlResult};

/// File name prefix of the daily log files
pub const LOG_FILE_PREFIX: &str = "composite-authz.log";

/// Install the global subscriber described by `config`
///
/// When logging to a directory the returned guard flushes pending lines on
/// drop and must be kept alive for the lifetime of the program.
pub fn init_logging(config: &LoggingConfig) -> AccessControlResult<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => env_filter(&config.level)?,
    };

    let (writer, guard) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let ansi = config.directory.is_none() && !config.json;
    let layer = if config.json {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer().with_ansi(ansi).with_writer(writer).boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| AccessControlError::other(format!("Failed to install logger: {}", e)))?;

    tracing::debug!("Logging initialized at level '{}'", config.level);
    Ok(guard)
}

/// Parse a filter directive such as `info` or `composite_authz=debug,warn`
pub fn env_filter(level: &str) -> AccessControlResult<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| AccessControlError::InvalidConfig(format!("invalid log level '{}': {}", level, e)))
}
