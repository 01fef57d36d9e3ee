//! Logging configuration using tracing
//!
//! The headless shell owns stdout for its NDJSON stream, so every log line
//! goes to a rolling file instead.

use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable holding the log filter
pub const LOG_FILTER_ENV: &str = "CHARGEPANEL_LOG";

/// Rotated files are named `chargepanel.log.YYYY-MM-DD`
const LOG_FILE_PREFIX: &str = "chargepanel.log";

const DEFAULT_FILTER: &str =
    "chargepanel=info,chargepanel_app=info,chargepanel_device=info,chargepanel_core=info,warn";

/// Initialize the logging subsystem and return the directory logs go to.
///
/// `log_dir` overrides the default `<data_local_dir>/chargepanel/logs/`.
///
/// # Examples
/// ```bash
/// CHARGEPANEL_LOG=debug chargepanel --device http://192.168.0.10
/// CHARGEPANEL_LOG=chargepanel_device=trace chargepanel --log-dir /tmp/panel-logs
/// ```
pub fn init(log_dir: Option<&Path>) -> Result<PathBuf> {
    let log_dir = log_directory(log_dir);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    let (env_filter, from_env) = match EnvFilter::try_from_env(LOG_FILTER_ENV) {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(DEFAULT_FILTER), false),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!(
        "Logging to {} (filter from {})",
        log_dir.display(),
        if from_env { LOG_FILTER_ENV } else { "defaults" }
    );

    Ok(log_dir)
}

/// Directory the rolling log files are written to
pub fn log_directory(override_dir: Option<&Path>) -> PathBuf {
    match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chargepanel")
            .join("logs"),
    }
}
