//! Structured logging setup.
//!
//! stdout carries the IPC event stream, so every human-facing layer writes to
//! stderr or to the rolling log file.

use std::fs;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset. HTTP and polling internals are
/// noisy at `info`.
const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn,hyper_util=warn,mio=warn";

/// Initialize the tracing subscriber.
///
/// Sets up:
/// - File output: daily rolling `assistant.*.log` files in `log_dir`, keeping
///   the latest 5. If the directory cannot be created the file layer is
///   skipped and logging continues on stderr alone.
/// - Console output on stderr.
/// - `RUST_LOG` environment filter, defaulting to [`DEFAULT_FILTER`].
///
/// Returns an error if a global subscriber is already installed.
pub fn init(log_dir: &Path) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .compact();

    let file_appender = fs::create_dir_all(log_dir)
        .map_err(anyhow::Error::from)
        .and_then(|_| {
            RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("assistant")
                .filename_suffix("log")
                .max_log_files(5)
                .build(log_dir)
                .map_err(anyhow::Error::from)
        });

    let (file_layer, file_error) = match file_appender {
        Ok(appender) => (
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Logger already initialized: {}", e))?;

    match file_error {
        Some(e) => tracing::warn!(
            log_dir = %log_dir.display(),
            "File logging disabled: {}", e
        ),
        None => tracing::info!(log_dir = %log_dir.display(), "Logger initialized"),
    }

    Ok(())
}
