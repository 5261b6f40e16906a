use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-generated chat identifier.
pub type ChatId = String;

/// Author of a message. Fixed when the message is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn in a chat. The id is supplied by the caller and only needs to be
/// unique inside its chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub role: MessageRole,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        role: MessageRole,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            role,
            timestamp,
        }
    }

    pub fn user(id: impl Into<String>, content: impl Into<String>, timestamp: i64) -> Self {
        Self::new(id, content, MessageRole::User, timestamp)
    }

    pub fn assistant(id: impl Into<String>, content: impl Into<String>, timestamp: i64) -> Self {
        Self::new(id, content, MessageRole::Assistant, timestamp)
    }
}

/// A conversation thread. Messages are kept in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Chat {
    pub(crate) fn new(id: ChatId, title: String, now: i64) -> Self {
        Self {
            id,
            title,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == message_id)
    }

    /// Refreshes `updated_at` without ever moving it backwards.
    pub(crate) fn touch(&mut self, now: i64) {
        self.updated_at = self.updated_at.max(now);
    }
}
