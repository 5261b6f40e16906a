pub mod commands;
pub mod types;

pub use commands::StoreCommand;
pub use types::{Chat, ChatId, Message, MessageRole};
