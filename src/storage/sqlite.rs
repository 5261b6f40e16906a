use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

use super::StateStorage;
use super::error::StorageResult;
use super::models::{decode_snapshot, encode_snapshot};
use crate::store::ChatState;

/// Snapshot slots in a SQLite key/value table
pub struct SqliteStorage {
    conn: Connection,
    key: String,
}

impl SqliteStorage {
    /// Open (or create) the database file at `path`
    pub fn with_path<P: AsRef<Path>>(path: P, key: impl Into<String>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, key)
    }

    pub fn in_memory(key: impl Into<String>) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, key)
    }

    fn from_connection(conn: Connection, key: impl Into<String>) -> StorageResult<Self> {
        let storage = Self {
            conn,
            key: key.into(),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn init_schema(&self) -> StorageResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                saved_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Remove this storage's snapshot row
    pub fn delete(&self) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM snapshots WHERE key = ?1", params![self.key])?;
        Ok(())
    }

    /// All keys with a saved snapshot, most recently saved first
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM snapshots ORDER BY saved_at DESC, key ASC")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    /// Epoch-millisecond time of the last save under this key
    pub fn saved_at(&self) -> StorageResult<Option<i64>> {
        let saved_at = self
            .conn
            .query_row(
                "SELECT saved_at FROM snapshots WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(saved_at)
    }
}

impl StateStorage for SqliteStorage {
    fn load(&self) -> StorageResult<Option<ChatState>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM snapshots WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| decode_snapshot(&raw)).transpose()
    }

    fn save(&self, state: &ChatState) -> StorageResult<()> {
        let value = encode_snapshot(state)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshots (key, value, saved_at)
             VALUES (?1, ?2, ?3)",
            params![self.key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_in_memory() {
        let storage = SqliteStorage::in_memory("chat-store").unwrap();
        assert!(storage.load().unwrap().is_none());

        let state = ChatState {
            error: Some("offline".into()),
            ..ChatState::default()
        };
        storage.save(&state).unwrap();
        assert_eq!(storage.load().unwrap(), Some(state));
        assert!(storage.saved_at().unwrap().is_some());
    }

    #[test]
    fn upsert_keeps_single_row_per_key() {
        let storage = SqliteStorage::in_memory("chat-store").unwrap();
        storage.save(&ChatState::default()).unwrap();
        storage.save(&ChatState::default()).unwrap();
        assert_eq!(storage.keys().unwrap(), vec!["chat-store".to_string()]);

        storage.delete().unwrap();
        assert!(storage.keys().unwrap().is_empty());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn survives_reopen() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("chats.db");
        let state = ChatState {
            is_loading: true,
            ..ChatState::default()
        };

        SqliteStorage::with_path(&db_path, "chat-store")
            .unwrap()
            .save(&state)
            .unwrap();

        let reopened = SqliteStorage::with_path(&db_path, "chat-store").unwrap();
        assert_eq!(reopened.load().unwrap(), Some(state));
    }
}
