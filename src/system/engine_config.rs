// src/system/engine_config.rs

use crate::constants::{DEFAULT_ENGINE_PROGRAM, SNAKEFILE_ENV_VAR};
use crate::core::paths::{self, PathError};
use crate::models::EngineConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or writing `engine.toml`.
#[derive(Error, Debug)]
pub enum EngineConfigError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Path error: {0}")]
    Path(#[from] PathError),
    #[error("Failed to parse engine settings: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Loads `engine.toml` from the config directory, writing the defaults on first use.
/// `AVIARY_SNAKEFILE` overrides the snakefile for this run only.
pub fn load_engine_config() -> Result<EngineConfig, EngineConfigError> {
    let path = paths::get_engine_config_path()?;
    let config = load_or_create(&path)?;
    Ok(apply_env_override(config, env::var(SNAKEFILE_ENV_VAR).ok()))
}

pub fn load_or_create(path: &Path) -> Result<EngineConfig, EngineConfigError> {
    if !path.exists() {
        let default_config = generate_default_engine_config()?;
        let toml_string = toml::to_string_pretty(&default_config)?;
        fs::write(path, toml_string)?;
        log::info!("Created default engine settings at '{}'.", path.display());
        Ok(default_config)
    } else {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

fn generate_default_engine_config() -> Result<EngineConfig, EngineConfigError> {
    Ok(EngineConfig {
        program: DEFAULT_ENGINE_PROGRAM.to_string(),
        snakefile: paths::default_snakefile_path()?,
    })
}

fn apply_env_override(mut config: EngineConfig, snakefile: Option<String>) -> EngineConfig {
    if let Some(value) = snakefile.filter(|v| !v.trim().is_empty()) {
        log::debug!("Using snakefile from ${}: {}", SNAKEFILE_ENV_VAR, value);
        config.snakefile = PathBuf::from(value);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        let config = load_or_create(&path).unwrap();
        assert_eq!(config.program, "snakemake");
        assert!(config.snakefile.ends_with("aviary/workflow/Snakefile"));
        assert!(path.exists());
        assert_eq!(load_or_create(&path).unwrap(), config);
    }

    #[test]
    fn test_existing_file_is_respected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        fs::write(&path, "program = \"/opt/bin/snakemake\"\nsnakefile = \"/srv/Snakefile\"\n").unwrap();
        let config = load_or_create(&path).unwrap();
        assert_eq!(config.program, "/opt/bin/snakemake");
        assert_eq!(config.snakefile, PathBuf::from("/srv/Snakefile"));
    }

    #[test]
    fn test_env_override_replaces_snakefile() {
        let base = EngineConfig {
            program: "snakemake".to_string(),
            snakefile: PathBuf::from("/default/Snakefile"),
        };
        let overridden = apply_env_override(base.clone(), Some("/tmp/Snakefile".to_string()));
        assert_eq!(overridden.snakefile, PathBuf::from("/tmp/Snakefile"));
        assert_eq!(apply_env_override(base.clone(), Some(" ".to_string())), base);
        assert_eq!(apply_env_override(base.clone(), None), base);
    }
}
