use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::storage::{
    DEFAULT_STORAGE_KEY, JsonFileStorage, MemoryStorage, SqliteStorage, StateStorage,
    StorageResult, ensure_data_dir,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/chat-store.json";
pub const DEFAULT_DATA_DIR: &str = "data";
const SQLITE_FILE: &str = "chat-store.db";

/// Where snapshots go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Lost when the process exits.
    Memory,
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub storage_key: String,
    pub backend: Backend,
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            backend: Backend::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl StoreConfig {
    /// Build the storage adapter this config describes
    pub fn open_storage(&self) -> StorageResult<Box<dyn StateStorage + Send>> {
        let storage: Box<dyn StateStorage + Send> = match self.backend {
            Backend::Memory => Box::new(MemoryStorage::new(&self.storage_key)),
            Backend::Json => Box::new(JsonFileStorage::new(&self.data_dir, &self.storage_key)),
            Backend::Sqlite => {
                ensure_data_dir(&self.data_dir)?;
                Box::new(SqliteStorage::with_path(
                    self.data_dir.join(SQLITE_FILE),
                    &self.storage_key,
                )?)
            }
        };
        log::debug!(
            "Opened {:?} storage under key `{}` in {}",
            self.backend,
            self.storage_key,
            self.data_dir.display()
        );
        Ok(storage)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> StoreConfig {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<StoreConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                StoreConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::info!("Config file {} not found; using defaults", path.display());
            StoreConfig::default()
        }
        Err(err) => {
            log::warn!(
                "Failed to read config file {} ({err}); using defaults",
                path.display()
            );
            StoreConfig::default()
        }
    }
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &StoreConfig) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}
