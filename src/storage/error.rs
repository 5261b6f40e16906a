use thiserror::Error;

/// Failures reported by a [`StateStorage`](super::StateStorage) adapter.
///
/// The store never surfaces these to callers of its operations; it logs them
/// and carries on with the in-memory state.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("snapshot (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("background writer has shut down")]
    WriterClosed,
}

pub type StorageResult<T> = Result<T, StorageError>;
