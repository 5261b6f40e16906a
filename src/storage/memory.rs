use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::StateStorage;
use super::error::{StorageError, StorageResult};
use super::models::{DEFAULT_STORAGE_KEY, decode_snapshot, encode_snapshot};
use crate::store::ChatState;

/// Keyed in-memory slots holding serialized snapshots.
///
/// Clones share the same slots, so a second store built on a clone sees what
/// the first one saved.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    key: String,
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Same slots, different key.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            slots: Arc::clone(&self.slots),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw serialized value under this storage's key.
    pub fn raw(&self) -> StorageResult<Option<String>> {
        let slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slots.get(&self.key).cloned())
    }

    /// Writes a raw value, bypassing serialization. Useful to seed a corrupt slot.
    pub fn put_raw(&self, value: impl Into<String>) -> StorageResult<()> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.insert(self.key.clone(), value.into());
        Ok(())
    }

    pub fn remove(&self) -> StorageResult<()> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.remove(&self.key);
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_KEY)
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> StorageResult<Option<ChatState>> {
        match self.raw()? {
            Some(raw) => decode_snapshot(&raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, state: &ChatState) -> StorageResult<()> {
        let raw = encode_snapshot(state)?;
        self.put_raw(raw)
    }
}
