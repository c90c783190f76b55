// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, ENGINE_CONFIG_FILENAME, ENVIRONMENT_FILENAME};
use lazy_static::lazy_static;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref AVIARY_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

/// Errors raised while locating aviary directories or expanding user paths.
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not find system data directory.")]
    DataDirNotFound,
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to expand path '{path}': {message}")]
    Expansion { path: String, message: String },
}

/// Returns the path to the aviary configuration directory (`~/.config/aviary`).
/// Creates it if it doesn't exist.
///
/// Memoized: the first call computes and caches the path, later calls return
/// the cached value.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    // A poisoned lock only means another thread panicked mid-lookup; the cached value is still usable.
    let mut cached_path_guard = AVIARY_CONFIG_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(path) = &*cached_path_guard {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(CONFIG_DIR_NAME);

    if !config_path.exists() {
        fs::create_dir_all(&config_path).map_err(|e| PathError::ConfigDirCreation {
            path: config_path.display().to_string(),
            source: e,
        })?;
    }

    *cached_path_guard = Some(config_path.clone());
    Ok(config_path)
}

/// Returns the path to the persisted resource-path store.
pub fn get_environment_file_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(ENVIRONMENT_FILENAME))
}

/// Returns the path to the engine launch settings.
pub fn get_engine_config_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(ENGINE_CONFIG_FILENAME))
}

/// Where the bundled workflow is expected when `engine.toml` does not say otherwise
/// (`~/.local/share/aviary/workflow/Snakefile` on Linux).
pub fn default_snakefile_path() -> Result<PathBuf, PathError> {
    dirs::data_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join("workflow").join("Snakefile"))
        .ok_or(PathError::DataDirNotFound)
}

/// Expands `~` and `$VAR` references in a user-supplied path.
pub fn expand_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(raw).map_err(|e| PathError::Expansion {
        path: raw.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_user_path_leaves_absolute_paths_alone() {
        let path = expand_user_path("/data/gtdb/release207").unwrap();
        assert_eq!(path, PathBuf::from("/data/gtdb/release207"));
    }

    #[test]
    fn test_expand_user_path_expands_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let path = expand_user_path("~/gtdb").unwrap();
        assert_eq!(path, home.join("gtdb"));
    }

    #[test]
    fn test_expand_user_path_reports_undefined_variable() {
        let err = expand_user_path("$AVIARY_SURELY_UNDEFINED_VARIABLE/db").unwrap_err();
        assert!(matches!(err, PathError::Expansion { .. }));
    }
}
