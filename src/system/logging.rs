//! Logging system initialization
//!
//! Sets up the tracing subscriber from the loaded configuration: an
//! EnvFilter directive for the level, stderr by default, or a non-blocking
//! file writer when a log file is configured.

use crate::config::LoggingConfig;

/// Initialize the logging system.
///
/// Should be called once during startup, after configuration has been
/// loaded. The returned guard must be kept alive for the duration of the
/// program so buffered log writes are flushed on exit.
///
/// # Panics
/// * If the configured log file cannot be opened
/// * If a global subscriber was already installed
pub fn init_logging(config: &LoggingConfig) -> tracing_appender::non_blocking::WorkerGuard {
    let log_file = config.file.as_deref().filter(|f| !f.is_empty());

    let writer: Box<dyn std::io::Write + Send + Sync> = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .expect("Failed to open log file");
            Box::new(file)
        }
        None => Box::new(std::io::stderr()),
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::new(config.level.clone());

    tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(log_file.is_none())
        .init();

    guard
}
