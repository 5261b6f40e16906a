use crate::common::types::{ChatId, Message};

/// A state-changing store operation expressed as data, so controllers can
/// queue or forward it before it reaches the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    CreateChat {
        title: String,
    },
    DeleteChat {
        chat_id: ChatId,
    },
    UpdateChatTitle {
        chat_id: ChatId,
        title: String,
    },
    SelectChat {
        chat_id: Option<ChatId>,
    },
    AddMessage {
        chat_id: ChatId,
        message: Message,
    },
    DeleteMessage {
        chat_id: ChatId,
        message_id: String,
    },
    /// Replaces the content only; role and timestamp stay as they were.
    UpdateMessage {
        chat_id: ChatId,
        message_id: String,
        content: String,
    },
    SetLoading(bool),
    SetError(Option<String>),
    ClearChats,
}

impl StoreCommand {
    /// Short operation name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            StoreCommand::CreateChat { .. } => "create_chat",
            StoreCommand::DeleteChat { .. } => "delete_chat",
            StoreCommand::UpdateChatTitle { .. } => "update_chat_title",
            StoreCommand::SelectChat { .. } => "select_chat",
            StoreCommand::AddMessage { .. } => "add_message",
            StoreCommand::DeleteMessage { .. } => "delete_message",
            StoreCommand::UpdateMessage { .. } => "update_message",
            StoreCommand::SetLoading(_) => "set_loading",
            StoreCommand::SetError(_) => "set_error",
            StoreCommand::ClearChats => "clear_chats",
        }
    }
}
