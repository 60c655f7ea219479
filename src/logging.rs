use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Route `tracing` output to a daily rolling file in `log_dir`.
///
/// The TUI owns the terminal, so nothing is written to stdout. Keep the
/// returned guard alive until exit or buffered lines are lost.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  let file_appender = tracing_appender::rolling::daily(log_dir, "tradetrackr.log");
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

  let file_layer = fmt::layer()
    .with_writer(non_blocking)
    .with_ansi(false)
    .with_target(true);

  tracing_subscriber::registry()
    .with(env_filter)
    .with(file_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialise logging: {}", e))?;

  Ok(guard)
}
