pub mod background;
pub mod error;
pub mod json_file;
pub mod memory;
pub mod models;
pub mod sqlite;

pub use background::BackgroundStorage;
pub use error::{StorageError, StorageResult};
pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;
pub use models::{DEFAULT_STORAGE_KEY, SNAPSHOT_VERSION, decode_snapshot, encode_snapshot};
pub use sqlite::SqliteStorage;

use std::fs;
use std::path::Path;

use crate::store::ChatState;

/// Durable slot the store loads from once and saves to after every mutation.
pub trait StateStorage {
    /// Returns the last saved snapshot, or `None` when nothing was saved yet.
    fn load(&self) -> StorageResult<Option<ChatState>>;

    /// Overwrites the slot with `state`.
    fn save(&self, state: &ChatState) -> StorageResult<()>;
}

impl<T: StateStorage + ?Sized> StateStorage for Box<T> {
    fn load(&self) -> StorageResult<Option<ChatState>> {
        (**self).load()
    }

    fn save(&self, state: &ChatState) -> StorageResult<()> {
        (**self).save(state)
    }
}

/// Ensure data directory exists
pub fn ensure_data_dir<P: AsRef<Path>>(dir: P) -> std::io::Result<()> {
    let dir = dir.as_ref();
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir)
}
