//! Key to integer flag storage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Errors from settings persistence.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted integer flags, looked up by key.
pub trait Settings {
    fn get_int(&self, key: &str, default: i64) -> i64;

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), SettingsError>;
}

/// Settings kept in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: BTreeMap<String, i64>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Settings for MemorySettings {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.values.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    values: BTreeMap<String, i64>,
}

/// Settings stored as a JSON file, rewritten on every change.
#[derive(Debug)]
pub struct JsonSettings {
    path: PathBuf,
    file: SettingsFile,
}

impl JsonSettings {
    /// Open the file at `path`, starting empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let file: SettingsFile = if path.exists() {
            serde_json::from_reader(std::fs::File::open(&path)?)?
        } else {
            SettingsFile::default()
        };
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), SettingsError> {
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, &self.file)?;
        Ok(())
    }
}

impl Settings for JsonSettings {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.file.values.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), SettingsError> {
        self.file.values.insert(key.to_string(), value);
        self.save()
    }
}
