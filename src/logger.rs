use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{Config, app_data_dir};

/// Set up application logging based on configuration
///
/// `RUST_LOG` takes precedence over the configured level. Returns the worker
/// guard when logging to a file; it must be kept alive to flush log lines.
/// If the log file cannot be opened, logging falls back to stderr.
pub fn setup_logging(config: &Config) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    let (writer, guard) = select_writer(config.log_file_path().as_deref());

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(guard.is_none())
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("A global tracing subscriber is already set");
    }
    guard
}

// ファイルを開けなければ stderr に書く
fn select_writer(file_path: Option<&str>) -> (BoxMakeWriter, Option<WorkerGuard>) {
    match file_path {
        None => (BoxMakeWriter::new(std::io::stderr), None),
        Some(path) => match create_file_logger(path) {
            Ok((file_writer, guard)) => (BoxMakeWriter::new(file_writer), Some(guard)),
            Err(e) => {
                eprintln!(
                    "Failed to open log file {}: {}. Logging to stderr.",
                    path, e
                );
                (BoxMakeWriter::new(std::io::stderr), None)
            }
        },
    }
}

// Create a non-rotating file logger for the given path
fn create_file_logger(path: &str) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    let log_path = std::path::PathBuf::from(path);
    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| app_data_dir().join("logs"));

    std::fs::create_dir_all(&log_dir)?;

    let log_file_name = log_path
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("stream-notifier.log"))
        .to_string_lossy()
        .into_owned();

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(log_file_name)
        .build(&log_dir)
        .map_err(std::io::Error::other)?;
    Ok(tracing_appender::non_blocking(file_appender))
}
