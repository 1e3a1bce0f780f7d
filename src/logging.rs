//! Diagnostic logging.
//!
//! The terminal belongs to the canvases, so diagnostics go to a file named by
//! `INLINE_CANVAS_LOG`. Without one, no subscriber is installed and `tracing` macros are free.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

use crate::config::{EnvConfig, DEFAULT_LOG_FILTER};

/// Installs the file subscriber described by `config`.
///
/// Returns `Ok(true)` when this call installed it; `Ok(false)` when logging is not configured
/// or a global subscriber already exists.
pub fn init(config: &EnvConfig) -> io::Result<bool> {
    let Some(path) = config.log_file.as_deref() else {
        return Ok(false);
    };
    let subscriber = file_subscriber(Path::new(path), &config.log_filter)?;
    Ok(tracing::subscriber::set_global_default(subscriber).is_ok())
}

/// Builds a plain-text subscriber appending to `path`.
pub fn file_subscriber(path: &Path, filter: &str) -> io::Result<impl Subscriber + Send + Sync> {
    let file = open_log(path)?;
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .finish())
}

fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
