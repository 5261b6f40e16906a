use std::sync::atomic::{AtomicUsize, Ordering};

use chat_store::storage::{
    BackgroundStorage, JsonFileStorage, MemoryStorage, SqliteStorage, StorageResult,
    encode_snapshot,
};
use chat_store::{ChatState, ChatStore, Message, StateStorage, StorageError};
use tempfile::tempdir;

/// Fills a store with two chats, a few messages and both flags set.
fn populate<S: StateStorage>(store: &mut ChatStore<S>) {
    let planning = store.create_chat("Trip planning");
    store.add_message(&planning, Message::user("m1", "Where should I go?", 10));
    store.add_message(&planning, Message::assistant("m2", "Lisbon is lovely in April.", 20));

    let groceries = store.create_chat("Groceries");
    store.add_message(&groceries, Message::user("g1", "eggs, milk", 30));
    store.update_chat_title(&groceries, "Weekly groceries");

    store.select_chat(Some(&planning));
    store.set_loading(true);
    store.set_error(Some("rate limited".into()));
}

#[test]
fn memory_round_trip() {
    let storage = MemoryStorage::default();
    let mut store = ChatStore::new(storage.clone());
    populate(&mut store);

    let reloaded = ChatStore::new(storage);
    assert_eq!(*reloaded.state(), *store.state());
}

#[test]
fn json_file_round_trip() {
    let tmp = tempdir().unwrap();
    let mut store = ChatStore::new(JsonFileStorage::new(tmp.path(), "chat-store"));
    populate(&mut store);
    let expected = store.state();

    let reloaded = ChatStore::new(JsonFileStorage::new(tmp.path(), "chat-store"));
    assert_eq!(*reloaded.state(), *expected);
    assert_eq!(reloaded.chats()[0].title, "Weekly groceries");
    assert_eq!(reloaded.chats()[1].messages.len(), 2);
}

#[test]
fn sqlite_round_trip() {
    let tmp = tempdir().unwrap();
    let db_path = tmp.path().join("chats.db");
    let mut store = ChatStore::new(SqliteStorage::with_path(&db_path, "chat-store").unwrap());
    populate(&mut store);
    let expected = store.state();
    drop(store);

    let reloaded = ChatStore::new(SqliteStorage::with_path(&db_path, "chat-store").unwrap());
    assert_eq!(*reloaded.state(), *expected);
    assert!(reloaded.get_current_chat().is_some());
}

#[test]
fn snapshot_uses_documented_layout() {
    let storage = MemoryStorage::new("chat-store");
    let mut store = ChatStore::new(storage.clone());
    populate(&mut store);

    let raw = storage.raw().unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], 0);

    let state = &value["state"];
    assert_eq!(state["isLoading"], true);
    assert_eq!(state["error"], "rate limited");
    assert_eq!(state["currentChatId"], state["chats"][1]["id"]);
    let chat = &state["chats"][1];
    assert!(chat["createdAt"].is_i64());
    assert!(chat["updatedAt"].is_i64());
    assert_eq!(chat["messages"][1]["role"], "assistant");
    assert_eq!(chat["messages"][1]["timestamp"], 20);
}

#[test]
fn corrupt_snapshot_starts_empty() {
    let storage = MemoryStorage::default();
    storage.put_raw("{\"state\": [not json").unwrap();

    let store = ChatStore::new(storage);
    assert_eq!(*store.state(), ChatState::default());
}

#[test]
fn unsupported_version_starts_empty() {
    let storage = MemoryStorage::default();
    let raw = encode_snapshot(&ChatState {
        is_loading: true,
        ..ChatState::default()
    })
    .unwrap()
    .replace("\"version\":0", "\"version\":99");
    storage.put_raw(raw).unwrap();

    assert!(matches!(
        storage.load(),
        Err(StorageError::UnsupportedVersion { found: 99, .. })
    ));
    let store = ChatStore::new(storage);
    assert!(!store.is_loading());
}

/// Storage whose every call fails, counting save attempts.
#[derive(Default)]
struct BrokenStorage {
    saves: AtomicUsize,
}

impl StateStorage for BrokenStorage {
    fn load(&self) -> StorageResult<Option<ChatState>> {
        Err(StorageError::Io(std::io::Error::other("disk unavailable")))
    }

    fn save(&self, _state: &ChatState) -> StorageResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Io(std::io::Error::other("quota exceeded")))
    }
}

#[test]
fn storage_failures_never_reach_callers() {
    let mut store = ChatStore::new(BrokenStorage::default());
    assert!(store.chats().is_empty());

    let chat_id = store.create_chat("still works");
    store.add_message(&chat_id, Message::user("m1", "hello", 1));
    store.delete_chat("unknown");

    assert_eq!(store.get_chat_by_id(&chat_id).unwrap().messages.len(), 1);
    // the no-op delete does not attempt a save
    assert_eq!(store.storage().saves.load(Ordering::SeqCst), 2);
}

#[test]
fn save_count_matches_state_changes() {
    let storage = CountingStorage::default();
    let mut store = ChatStore::new(storage);
    let chat_id = store.create_chat("a");
    store.update_chat_title(&chat_id, "b");
    store.select_chat(None);
    store.set_loading(false);
    store.update_message(&chat_id, "missing", "x");
    store.clear_chats();

    assert_eq!(store.storage().saves.load(Ordering::SeqCst), 5);
}

#[derive(Default)]
struct CountingStorage {
    inner: MemoryStorage,
    saves: AtomicUsize,
}

impl StateStorage for CountingStorage {
    fn load(&self) -> StorageResult<Option<ChatState>> {
        self.inner.load()
    }

    fn save(&self, state: &ChatState) -> StorageResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(state)
    }
}

#[tokio::test]
async fn background_writer_persists_final_state() {
    let tmp = tempdir().unwrap();
    let file = JsonFileStorage::new(tmp.path(), "chat-store");

    let mut store = ChatStore::new(BackgroundStorage::spawn(file.clone()));
    let chat_id = store.create_chat("async");
    for n in 0..50 {
        store.add_message(&chat_id, Message::user(format!("m{n}"), "burst", n));
    }
    let expected = store.state();
    store.into_storage().shutdown().await;

    assert_eq!(file.load().unwrap().as_ref(), Some(expected.as_ref()));
}
