// src/core/store.rs

use crate::core::paths;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::fs;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors raised while reading or writing persisted paths.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse '{path}': {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Failed to replace store file: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("Could not locate the aviary config directory: {0}")]
    ConfigDirNotFound(#[from] paths::PathError),
}

/// Key/value storage for resource paths that outlives a single invocation.
///
/// Keys are environment-variable names (`GTDBTK_DATA_PATH`, ...).
pub trait PathStore {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, name: &str, value: &str) -> Result<(), StoreError>;
}

/// On-disk layout of `environment.toml`.
#[derive(Serialize, Deserialize, Debug, Default)]
struct EnvironmentFile {
    #[serde(default)]
    paths: BTreeMap<String, String>,
}

/// A [`PathStore`] backed by a TOML file.
///
/// Every `set` rewrites the file through a temporary sibling and a rename, so
/// readers never observe a half-written file. Two concurrent writers are not
/// serialized; the last rename wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store at its default location in the user config directory.
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::new(paths::get_environment_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<EnvironmentFile, StoreError> {
        if !self.path.exists() {
            return Ok(EnvironmentFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|source| StoreError::TomlParse {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn save(&self, file: &EnvironmentFile) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let toml_string = toml::to_string_pretty(file)?;
        let mut temp_file = NamedTempFile::new_in(&parent)?;
        temp_file.write_all(toml_string.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&self.path)?;
        Ok(())
    }
}

impl PathStore for FileStore {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.paths.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<(), StoreError> {
        let mut file = self.load()?;
        if file.paths.get(name).map(String::as_str) == Some(value) {
            log::debug!("'{}' already persisted with the same value.", name);
            return Ok(());
        }
        file.paths.insert(name.to_string(), value.to_string());
        self.save(&file)?;
        log::debug!("Persisted '{}' to '{}'.", name, self.path.display());
        Ok(())
    }
}

/// An in-process [`PathStore`], used where nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(entries: &[(&str, &str)]) -> Self {
        let values = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }
}

impl PathStore for MemoryStore {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        Ok(values.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("environment.toml"));
        assert_eq!(store.get("GTDBTK_DATA_PATH").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_is_visible_to_a_fresh_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("environment.toml");
        FileStore::new(&path)
            .set("GTDBTK_DATA_PATH", "/data/gtdb/release207")
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get("GTDBTK_DATA_PATH").unwrap().as_deref(),
            Some("/data/gtdb/release207")
        );
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[paths]"));
    }

    #[test]
    fn test_set_same_value_twice_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("environment.toml");
        let store = FileStore::new(&path);
        store.set("CONDA_ENV_PATH", "/opt/envs").unwrap();
        let first = fs::read_to_string(&path).unwrap();
        store.set("CONDA_ENV_PATH", "/opt/envs").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_set_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("environment.toml"));
        store.set("CONDA_ENV_PATH", "/opt/envs").unwrap();
        store.set("EGGNOG_DATA_DIR", "/db/eggnog").unwrap();
        assert_eq!(store.get("CONDA_ENV_PATH").unwrap().as_deref(), Some("/opt/envs"));
        assert_eq!(store.get("EGGNOG_DATA_DIR").unwrap().as_deref(), Some("/db/eggnog"));
    }

    #[test]
    fn test_last_writer_wins_between_instances() {
        // Two handles on the same file do not coordinate.
        let dir = tempdir().unwrap();
        let path = dir.path().join("environment.toml");
        let a = FileStore::new(&path);
        let b = FileStore::new(&path);
        a.set("GTDBTK_DATA_PATH", "/a").unwrap();
        b.set("GTDBTK_DATA_PATH", "/b").unwrap();
        assert_eq!(a.get("GTDBTK_DATA_PATH").unwrap().as_deref(), Some("/b"));
    }

    #[test]
    fn test_corrupt_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("environment.toml");
        fs::write(&path, "paths = [not toml").unwrap();
        let err = FileStore::new(&path).get("GTDBTK_DATA_PATH").unwrap_err();
        assert!(matches!(err, StoreError::TomlParse { .. }));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::with(&[("BUSCO_DB", "/db/busco")]);
        assert_eq!(store.get("BUSCO_DB").unwrap().as_deref(), Some("/db/busco"));
        store.set("BUSCO_DB", "/other").unwrap();
        assert_eq!(store.get("BUSCO_DB").unwrap().as_deref(), Some("/other"));
        assert_eq!(store.get("ENRICHM_DB").unwrap(), None);
    }
}
