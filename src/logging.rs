use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "GH_STARS_LOG";
const LOG_FILE: &str = "gh-stars.log";

/// Directory the log file is written to
pub fn log_dir() -> PathBuf {
  dirs::data_dir()
    .or_else(dirs::home_dir)
    .unwrap_or_else(|| PathBuf::from("."))
    .join("gh-stars")
}

/// Route `tracing` output to a log file, since the terminal belongs to the UI.
///
/// The filter comes from `GH_STARS_LOG` (e.g. `debug` or `gh_stars=trace`),
/// defaulting to `info`. Keep the returned guard alive until exit so buffered
/// lines are flushed.
pub fn init() -> Result<WorkerGuard> {
  let dir = log_dir();
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
