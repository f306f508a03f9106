//! Tracing setup. Everything goes to stderr; stdout carries MCP traffic.

use anyhow::Result;
use chrono::Utc;
use historian_config::PluginConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Keeps the non-blocking file writer flushing until dropped.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    pub log_file: Option<PathBuf>,
}

/// Filter used before the configuration is known.
pub fn bootstrap_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Run `f` with a temporary stderr subscriber, so warnings raised while
/// loading the configuration are not lost.
pub fn with_bootstrap_logging<T>(f: impl FnOnce() -> T) -> T {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(bootstrap_filter())
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// `RUST_LOG` wins; otherwise the configured level (`debug: true` forces debug).
fn filter_for(config: &PluginConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_directive()))
}

/// Create a log writer at `{state_dir}/logs/historian-{timestamp}.log`.
pub fn create_log_writer(
    state_dir: &Path,
) -> Result<(
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
    PathBuf,
)> {
    let log_dir = state_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_name = format!("historian-{}.log", Utc::now().format("%Y%m%d-%H%M%S"));
    let path = log_dir.join(&file_name);
    let file_appender = tracing_appender::rolling::never(&log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    Ok((non_blocking, guard, path))
}

/// Install the process-wide subscriber for the loaded configuration.
pub fn init(config: &PluginConfig) -> LoggingGuard {
    let mut file_guard = None;
    let mut log_file = None;
    let file_layer = if config.debug {
        let state_dir = historian_config::paths::state_dir()
            .unwrap_or_else(historian_config::paths::state_dir_fallback);
        match create_log_writer(&state_dir) {
            Ok((writer, guard, path)) => {
                file_guard = Some(guard);
                log_file = Some(path);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
            }
            Err(e) => {
                eprintln!("warning: cannot create debug log file: {e:#}");
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter_for(config))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .ok();

    if let Some(path) = &log_file {
        tracing::debug!(path = %path.display(), "Debug log enabled");
    }

    LoggingGuard {
        _file_guard: file_guard,
        log_file,
    }
}
