use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::StorageResult;
use super::models::{decode_snapshot, encode_snapshot_pretty};
use super::{StateStorage, ensure_data_dir};
use crate::store::ChatState;

/// Stores the snapshot as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(dir: P, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the snapshot file if present
    pub fn remove(&self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl StateStorage for JsonFileStorage {
    fn load(&self) -> StorageResult<Option<ChatState>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => decode_snapshot(&content).map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("No snapshot at {}", self.path.display());
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, state: &ChatState) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            ensure_data_dir(parent)?;
        }
        let json = encode_snapshot_pretty(state)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
