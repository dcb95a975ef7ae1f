//! JSON persistence for the profiles document and the change log.
//!
//! Both files are replaced wholesale on every write. There is no locking, so
//! two cm processes writing at the same time race and the last write wins.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{cm_dir, config_file_path, history_file_path};
use crate::error::{CmError, Result};
use crate::history::HistoryLog;
use crate::profile::Profile;

/// Root of `config.json`: every profile plus the selection pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreData {
    #[serde(default)]
    pub models: Vec<Profile>,
    #[serde(default)]
    pub current_model: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoreData {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            models: Vec::new(),
            current_model: None,
            created_at: now,
        }
    }

    pub fn find(&self, name: &str) -> Option<&Profile> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|m| m.name == name)
    }

    pub fn current(&self) -> Option<&Profile> {
        self.current_model.as_deref().and_then(|name| self.find(name))
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.current_model.as_deref() == Some(name)
    }
}

/// File-backed store rooted at one config directory.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
    config_path: PathBuf,
    history_path: PathBuf,
}

impl Store {
    /// Store under the platform config directory (or `CM_CONFIG_DIR`).
    pub fn open_default() -> Self {
        Self::at(cm_dir())
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            config_path: config_file_path(&dir),
            history_path: history_file_path(&dir),
            dir,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Create the directory and default documents if they are missing.
    pub fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| CmError::io("create config directory", &self.dir, e))?;

        if !self.config_path.exists() {
            info!(path = %self.config_path.display(), "initializing model store");
            write_json(&self.config_path, &StoreData::new(Utc::now()))?;
        }
        if !self.history_path.exists() {
            info!(path = %self.history_path.display(), "initializing change history");
            write_json(&self.history_path, &HistoryLog::default())?;
        }
        Ok(())
    }

    pub fn read_store(&self) -> Result<StoreData> {
        self.ensure_exists()?;
        read_json(&self.config_path)
    }

    pub fn write_store(&self, data: &StoreData) -> Result<()> {
        write_json(&self.config_path, data)
    }

    pub fn read_history(&self) -> Result<HistoryLog> {
        self.ensure_exists()?;
        read_json(&self.history_path)
    }

    pub fn write_history(&self, log: &HistoryLog) -> Result<()> {
        write_json(&self.history_path, log)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| CmError::io("read", path, e))?;
    serde_json::from_str(&content).map_err(|e| CmError::json("parse", path, e))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut content =
        serde_json::to_string_pretty(value).map_err(|e| CmError::json("serialize", path, e))?;
    content.push('\n');
    fs::write(path, content).map_err(|e| CmError::io("write", path, e))?;
    debug!(path = %path.display(), "wrote document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_read_creates_both_documents() {
        let tmp = TempDir::new().unwrap();
        let store = Store::at(tmp.path().join("nested").join("cm"));

        let data = store.read_store().unwrap();
        assert!(data.models.is_empty());
        assert_eq!(data.current_model, None);
        assert!(store.config_path().exists());
        assert!(store.history_path().exists());

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.config_path()).unwrap()).unwrap();
        assert!(raw["currentModel"].is_null());
        assert!(raw["models"].as_array().unwrap().is_empty());
        assert!(raw["createdAt"].is_string());
    }

    #[test]
    fn ensure_exists_keeps_existing_documents() {
        let tmp = TempDir::new().unwrap();
        let store = Store::at(tmp.path());
        store.ensure_exists().unwrap();

        let mut data = store.read_store().unwrap();
        data.current_model = Some("kept".to_string());
        store.write_store(&data).unwrap();

        store.ensure_exists().unwrap();
        assert_eq!(
            store.read_store().unwrap().current_model.as_deref(),
            Some("kept")
        );
    }

    #[test]
    fn corrupt_documents_are_reported_with_their_path() {
        let tmp = TempDir::new().unwrap();
        let store = Store::at(tmp.path());
        store.ensure_exists().unwrap();
        fs::write(store.config_path(), "{ not json").unwrap();

        match store.read_store() {
            Err(CmError::Json { path, .. }) => assert_eq!(path, store.config_path()),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn documents_are_pretty_printed() {
        let tmp = TempDir::new().unwrap();
        let store = Store::at(tmp.path());
        store.ensure_exists().unwrap();
        let content = fs::read_to_string(store.history_path()).unwrap();
        assert!(content.contains("\n  \"changes\""), "{content}");
    }
}
