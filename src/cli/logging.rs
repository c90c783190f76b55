// src/cli/logging.rs

use log::LevelFilter;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

static LOGGING_TO_FILE: AtomicBool = AtomicBool::new(false);

/// Errors raised while setting up the global logger.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Log file '{0}' already exists. Choose another path or remove it first.")]
    LogTargetExists(PathBuf),
    #[error("Could not open log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Verbosity must be between 1 and 5, got {0}.")]
    InvalidVerbosity(u8),
}

/// Maps the 1..=5 verbosity scale (critical..debug) to a log filter.
/// `log` has no critical level, so 1 and 2 both keep errors only.
pub fn level_for(verbosity: u8) -> Result<LevelFilter, LoggingError> {
    match verbosity {
        1 | 2 => Ok(LevelFilter::Error),
        3 => Ok(LevelFilter::Warn),
        4 => Ok(LevelFilter::Info),
        5 => Ok(LevelFilter::Debug),
        other => Err(LoggingError::InvalidVerbosity(other)),
    }
}

/// Creates the log file, refusing to touch an existing one.
pub fn open_log_target(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => LoggingError::LogTargetExists(path.to_path_buf()),
            _ => LoggingError::Io(e),
        })
}

/// Installs the global logger. Records go to stderr, or only to `log_file`
/// when one is given.
pub fn init(verbosity: u8, log_file: Option<&Path>) -> Result<(), LoggingError> {
    let level = level_for(verbosity)?;
    let target = match log_file {
        Some(path) => Some(open_log_target(path)?),
        None => None,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format(|buf, record| {
        writeln!(
            buf,
            "{} {}: {}",
            buf.timestamp_seconds(),
            record.level(),
            record.args()
        )
    });
    let to_file = target.is_some();
    match target {
        Some(file) => builder.target(env_logger::Target::Pipe(Box::new(file))),
        None => builder.target(env_logger::Target::Stderr),
    };

    // A logger may already be installed (e.g. by a test harness); keep it.
    if builder.try_init().is_ok() {
        LOGGING_TO_FILE.store(to_file, Ordering::Relaxed);
    }
    Ok(())
}

/// True once records are going to a `--log` file instead of stderr.
pub fn logging_to_file() -> bool {
    LOGGING_TO_FILE.load(Ordering::Relaxed)
}
