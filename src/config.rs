//! Database configuration

use crate::error::DbResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for an on-disk fingerprint database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Root directory for all data
    pub data_dir: PathBuf,
    /// Persist the store snapshot after every mutation. Safest; turn off
    /// for bulk ingestion and call `persist()` at batch boundaries.
    pub sync_on_write: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("waveprint_data"),
            sync_on_write: true,
        }
    }
}

impl DatabaseConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Builder method: set the sync strategy
    pub fn sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Get path to the store snapshot file
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("catalog.db")
    }

    /// Get path to the config file
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// Load from a JSON config file
    pub fn load(path: &Path) -> DbResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save to a JSON config file
    pub fn save(&self, path: &Path) -> DbResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
