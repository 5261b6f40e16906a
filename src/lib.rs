//! Persisted store of chats and their messages.
//!
//! [`ChatStore`] owns the in-memory [`ChatState`] and writes a snapshot to a
//! [`StateStorage`] slot after every change. Storage failures are logged and
//! never reach callers.

pub mod common;
pub mod config;
pub mod storage;
pub mod store;

pub use common::{Chat, ChatId, Message, MessageRole, StoreCommand};
pub use storage::{StateStorage, StorageError};
pub use store::{ChatState, ChatStore, Clock, ManualClock, SystemClock};
