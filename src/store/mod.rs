mod clock;
mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use state::ChatState;

use std::cmp::Reverse;
use std::sync::Arc;

use uuid::Uuid;

use crate::common::{Chat, ChatId, Message, StoreCommand};
use crate::storage::StateStorage;

/// Single-owner chat collection backed by a [`StateStorage`] slot.
///
/// Every state-changing call publishes a fresh [`ChatState`] and hands it to
/// the storage. Operations addressed to an unknown chat or message are no-ops:
/// nothing is published and nothing is saved.
pub struct ChatStore<S: StateStorage> {
    state: Arc<ChatState>,
    storage: S,
    clock: Box<dyn Clock>,
}

impl<S: StateStorage> ChatStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }

    /// Loads the persisted snapshot once; any load failure starts empty.
    pub fn with_clock<C: Clock + 'static>(storage: S, clock: C) -> Self {
        let state = match storage.load() {
            Ok(Some(state)) => {
                log::info!(
                    "Restored {} chats from storage (current: {:?})",
                    state.chats.len(),
                    state.current_chat_id
                );
                state
            }
            Ok(None) => {
                log::debug!("No saved chat state; starting empty");
                ChatState::default()
            }
            Err(err) => {
                log::warn!("Failed to load saved chat state ({err}); starting empty");
                ChatState::default()
            }
        };

        Self {
            state: Arc::new(state),
            storage,
            clock: Box::new(clock),
        }
    }

    // ========== Chats ==========

    /// Creates a chat, puts it first and makes it current.
    pub fn create_chat(&mut self, title: impl Into<String>) -> ChatId {
        let chat_id = self.next_chat_id();
        let chat = Chat::new(chat_id.clone(), title.into(), self.clock.now_millis());
        log::debug!("Created chat {chat_id}");

        let mut next = (*self.state).clone();
        next.chats.insert(0, Arc::new(chat));
        next.current_chat_id = Some(chat_id.clone());
        self.publish(next);

        chat_id
    }

    pub fn delete_chat(&mut self, chat_id: &str) {
        let Some(index) = self.state.position(chat_id) else {
            log::debug!("delete_chat: unknown chat {chat_id}");
            return;
        };

        let mut next = (*self.state).clone();
        next.chats.remove(index);
        if next.current_chat_id.as_deref() == Some(chat_id) {
            next.current_chat_id = None;
        }
        self.publish(next);
    }

    pub fn update_chat_title(&mut self, chat_id: &str, title: impl Into<String>) {
        let title = title.into();
        self.update_chat(chat_id, "update_chat_title", |chat| {
            chat.title = title;
            true
        });
    }

    /// Sets the current chat without checking that it exists. A stale id is
    /// tolerated: [`ChatStore::get_current_chat`] resolves it to `None`.
    pub fn select_chat(&mut self, chat_id: Option<&str>) {
        if let Some(chat_id) = chat_id {
            if !self.state.contains(chat_id) {
                log::debug!("select_chat: {chat_id} is not a known chat");
            }
        }

        let mut next = (*self.state).clone();
        next.current_chat_id = chat_id.map(str::to_string);
        self.publish(next);
    }

    // ========== Messages ==========

    /// Appends to the chat. Message id uniqueness is the caller's concern.
    pub fn add_message(&mut self, chat_id: &str, message: Message) {
        self.update_chat(chat_id, "add_message", |chat| {
            chat.messages.push(message);
            true
        });
    }

    pub fn delete_message(&mut self, chat_id: &str, message_id: &str) {
        self.update_chat(chat_id, "delete_message", |chat| {
            let before = chat.messages.len();
            chat.messages.retain(|message| message.id != message_id);
            chat.messages.len() != before
        });
    }

    /// Rewrites the content of every message with `message_id`, matching how
    /// `delete_message` treats duplicate ids.
    pub fn update_message(&mut self, chat_id: &str, message_id: &str, content: impl Into<String>) {
        let content = content.into();
        self.update_chat(chat_id, "update_message", |chat| {
            let mut updated = false;
            for message in chat
                .messages
                .iter_mut()
                .filter(|message| message.id == message_id)
            {
                message.content.clone_from(&content);
                updated = true;
            }
            updated
        });
    }

    // ========== Flags ==========

    pub fn set_loading(&mut self, is_loading: bool) {
        let mut next = (*self.state).clone();
        next.is_loading = is_loading;
        self.publish(next);
    }

    pub fn set_error(&mut self, error: Option<String>) {
        let mut next = (*self.state).clone();
        next.error = error;
        self.publish(next);
    }

    /// Back to the empty initial state: no chats, no selection, flags cleared.
    pub fn clear_chats(&mut self) {
        log::info!("Clearing {} chats", self.state.chats.len());
        self.publish(ChatState::default());
    }

    pub fn apply(&mut self, command: StoreCommand) {
        log::trace!("apply {}", command.name());
        match command {
            StoreCommand::CreateChat { title } => {
                self.create_chat(title);
            }
            StoreCommand::DeleteChat { chat_id } => self.delete_chat(&chat_id),
            StoreCommand::UpdateChatTitle { chat_id, title } => {
                self.update_chat_title(&chat_id, title)
            }
            StoreCommand::SelectChat { chat_id } => self.select_chat(chat_id.as_deref()),
            StoreCommand::AddMessage { chat_id, message } => self.add_message(&chat_id, message),
            StoreCommand::DeleteMessage {
                chat_id,
                message_id,
            } => self.delete_message(&chat_id, &message_id),
            StoreCommand::UpdateMessage {
                chat_id,
                message_id,
                content,
            } => self.update_message(&chat_id, &message_id, content),
            StoreCommand::SetLoading(is_loading) => self.set_loading(is_loading),
            StoreCommand::SetError(error) => self.set_error(error),
            StoreCommand::ClearChats => self.clear_chats(),
        }
    }

    // ========== Reads ==========

    /// Current snapshot. Cheap to clone and safe to keep across mutations.
    pub fn state(&self) -> Arc<ChatState> {
        Arc::clone(&self.state)
    }

    pub fn chats(&self) -> &[Arc<Chat>] {
        &self.state.chats
    }

    pub fn current_chat_id(&self) -> Option<&str> {
        self.state.current_chat_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn get_current_chat(&self) -> Option<Arc<Chat>> {
        self.state.current_chat().cloned()
    }

    pub fn get_chat_by_id(&self, chat_id: &str) -> Option<Arc<Chat>> {
        self.state.chat(chat_id).cloned()
    }

    /// Chats ordered by `updated_at`, most recent first. Ties keep stored order.
    pub fn chats_by_recency(&self) -> Vec<Arc<Chat>> {
        let mut chats = self.state.chats.clone();
        chats.sort_by_key(|chat| Reverse(chat.updated_at));
        chats
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Tears the store down, handing back its storage (e.g. to flush it).
    pub fn into_storage(self) -> S {
        self.storage
    }

    // ========== Internals ==========

    /// Rebuilds the target chat and swaps it in, leaving every other chat
    /// `Arc` untouched. `edit` returns `false` when it found nothing to change.
    fn update_chat<F>(&mut self, chat_id: &str, op: &str, edit: F)
    where
        F: FnOnce(&mut Chat) -> bool,
    {
        let Some(index) = self.state.position(chat_id) else {
            log::debug!("{op}: unknown chat {chat_id}");
            return;
        };

        let mut chat = (*self.state.chats[index]).clone();
        if !edit(&mut chat) {
            log::debug!("{op}: nothing to change in chat {chat_id}");
            return;
        }
        chat.touch(self.clock.now_millis());

        let mut next = (*self.state).clone();
        next.chats[index] = Arc::new(chat);
        self.publish(next);
    }

    fn publish(&mut self, next: ChatState) {
        self.state = Arc::new(next);
        if let Err(err) = self.storage.save(&self.state) {
            log::warn!("Failed to persist chat state: {err}");
        }
    }

    fn next_chat_id(&self) -> ChatId {
        loop {
            let candidate = Uuid::new_v4().to_string();
            if !self.state.contains(&candidate) {
                return candidate;
            }
        }
    }
}
