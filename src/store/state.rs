use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::common::{Chat, ChatId};

/// Complete store snapshot. This is exactly what gets persisted.
///
/// Chats are shared behind `Arc`, so two snapshots taken around a mutation
/// point at the same allocation for every chat the mutation did not touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatState {
    /// Newest-created first.
    pub chats: Vec<Arc<Chat>>,
    pub current_chat_id: Option<ChatId>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat(&self, chat_id: &str) -> Option<&Arc<Chat>> {
        self.chats.iter().find(|chat| chat.id == chat_id)
    }

    pub(crate) fn position(&self, chat_id: &str) -> Option<usize> {
        self.chats.iter().position(|chat| chat.id == chat_id)
    }

    pub fn contains(&self, chat_id: &str) -> bool {
        self.position(chat_id).is_some()
    }

    /// The chat `current_chat_id` points at, if it still exists.
    pub fn current_chat(&self) -> Option<&Arc<Chat>> {
        self.current_chat_id
            .as_deref()
            .and_then(|chat_id| self.chat(chat_id))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(id: &str) -> Arc<Chat> {
        Arc::new(Chat::new(id.to_string(), format!("title {id}"), 1))
    }

    #[test]
    fn stale_current_id_resolves_to_none() {
        let state = ChatState {
            chats: vec![chat("a")],
            current_chat_id: Some("gone".into()),
            ..ChatState::default()
        };
        assert!(state.current_chat().is_none());
        assert!(!state.is_empty());
    }

    #[test]
    fn lookup_by_id() {
        let state = ChatState {
            chats: vec![chat("a"), chat("b")],
            current_chat_id: Some("b".into()),
            ..ChatState::default()
        };
        assert_eq!(state.chat("a").map(|c| c.title.as_str()), Some("title a"));
        assert_eq!(state.current_chat().map(|c| c.id.as_str()), Some("b"));
        assert!(state.contains("b"));
        assert!(!state.contains("c"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let state: ChatState = serde_json::from_str(r#"{"chats": []}"#).unwrap();
        assert!(state.is_empty());
    }
}
