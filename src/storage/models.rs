use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::{StorageError, StorageResult};
use crate::store::ChatState;

/// Storage key used when the caller does not pick one.
pub const DEFAULT_STORAGE_KEY: &str = "chat-store";

/// Format version written into every envelope.
pub const SNAPSHOT_VERSION: u32 = 0;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: &'a ChatState,
    version: u32,
}

/// Persisted form: `{"state": {...}, "version": 0}`
#[derive(Deserialize)]
struct Envelope {
    state: ChatState,
    #[serde(default)]
    version: u32,
}

pub fn encode_snapshot(state: &ChatState) -> StorageResult<String> {
    let envelope = EnvelopeRef {
        state,
        version: SNAPSHOT_VERSION,
    };
    Ok(serde_json::to_string(&envelope)?)
}

pub fn encode_snapshot_pretty(state: &ChatState) -> StorageResult<String> {
    let envelope = EnvelopeRef {
        state,
        version: SNAPSHOT_VERSION,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Decodes an envelope and checks the invariants the store relies on.
pub fn decode_snapshot(raw: &str) -> StorageResult<ChatState> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    if envelope.version != SNAPSHOT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: envelope.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    check_unique_chat_ids(&envelope.state)?;
    Ok(envelope.state)
}

fn check_unique_chat_ids(state: &ChatState) -> StorageResult<()> {
    let mut seen = HashSet::new();
    for chat in &state.chats {
        if !seen.insert(chat.id.as_str()) {
            return Err(StorageError::Corrupt(format!(
                "duplicate chat id `{}`",
                chat.id
            )));
        }
    }
    Ok(())
}
