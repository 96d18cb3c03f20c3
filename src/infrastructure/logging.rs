//! Logging setup
//!
//! Human-readable events go to stderr so stdout stays reserved for console
//! replies. When a log directory is configured, a JSON layer additionally
//! writes daily-rolling files under it.

use super::config::LoggingConfig;
use std::fs;
use std::io;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log file prefix inside the configured directory
const LOG_FILE_PREFIX: &str = "stock-metrics";

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Returns the
/// worker guards of the file appenders; keep them alive for the duration
/// of the program or buffered events are lost.
pub fn init_logging(config: &LoggingConfig) -> io::Result<Vec<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let mut guards = Vec::new();

    let file_layer = match &config.directory {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let (appender, guard) = create_appender(dir, LOG_FILE_PREFIX);
            guards.push(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .json()
                    .boxed(),
            )
        }
        None => None,
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))?;

    tracing::debug!(level = %config.level, directory = ?config.directory, "logging initialized");

    Ok(guards)
}

/// Create a daily rolling file appender
fn create_appender(dir: &std::path::Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, name);
    tracing_appender::non_blocking(appender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_appender_creates_file_under_directory() {
        let dir = Path::new("logs_test_appender");
        fs::remove_dir_all(dir).ok();
        fs::create_dir_all(dir).unwrap();

        {
            let (_writer, guard) = create_appender(dir, LOG_FILE_PREFIX);
            drop(guard);
        }

        let created = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX));
        assert!(created);

        fs::remove_dir_all(dir).ok();
    }
}
