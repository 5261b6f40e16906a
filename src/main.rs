use anyhow::{Context, Result, bail};
use chat_store::config::{self, StoreConfig};
use chat_store::storage::BackgroundStorage;
use chat_store::{ChatStore, Message, MessageRole};
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "chatctl",
    version,
    about = "Inspect and edit a persisted chat store"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List chats, most recently updated first
    List,
    /// Print a chat's messages (current chat if omitted)
    Show { chat: Option<String> },
    /// Create a chat and make it current
    New { title: String },
    Rename { chat: String, title: String },
    Select { chat: String },
    /// Append a message to a chat
    Say {
        chat: String,
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
        content: String,
    },
    Edit {
        chat: String,
        message: String,
        content: String,
    },
    /// Remove a single message
    Forget { chat: String, message: String },
    Delete { chat: String },
    /// Drop every chat and reset flags
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    User,
    Assistant,
}

impl From<RoleArg> for MessageRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => MessageRole::User,
            RoleArg::Assistant => MessageRole::Assistant,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let store_config = config::load_config(&cli.config);
    let mut store = open_store(&store_config)?;

    let outcome = run(&mut store, cli.command);

    store.into_storage().shutdown().await;
    outcome
}

fn open_store(store_config: &StoreConfig) -> Result<ChatStore<BackgroundStorage>> {
    let storage = store_config
        .open_storage()
        .context("Failed to open chat storage")?;
    Ok(ChatStore::new(BackgroundStorage::spawn(storage)))
}

fn run(store: &mut ChatStore<BackgroundStorage>, command: Command) -> Result<()> {
    match command {
        Command::List => {
            let current = store.current_chat_id().map(str::to_string);
            for chat in store.chats_by_recency() {
                let marker = if current.as_deref() == Some(chat.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} {}  {}  ({} messages)",
                    chat.id,
                    chat.title,
                    chat.messages.len()
                );
            }
        }
        Command::Show { chat } => {
            let chat = match chat {
                Some(chat) => {
                    let chat_id = resolve_chat(store, &chat)?;
                    store.get_chat_by_id(&chat_id)
                }
                None => store.get_current_chat(),
            };
            let Some(chat) = chat else {
                bail!("No chat selected");
            };
            println!("# {} ({})", chat.title, chat.id);
            for message in &chat.messages {
                println!("[{}] {}: {}", message.id, message.role, message.content);
            }
        }
        Command::New { title } => {
            let chat_id = store.create_chat(title);
            println!("{chat_id}");
        }
        Command::Rename { chat, title } => {
            let chat_id = resolve_chat(store, &chat)?;
            store.update_chat_title(&chat_id, title);
        }
        Command::Select { chat } => {
            let chat_id = resolve_chat(store, &chat)?;
            store.select_chat(Some(&chat_id));
        }
        Command::Say {
            chat,
            role,
            content,
        } => {
            let chat_id = resolve_chat(store, &chat)?;
            let message = Message::new(
                Uuid::new_v4().to_string(),
                content,
                role.into(),
                chrono::Utc::now().timestamp_millis(),
            );
            println!("{}", message.id);
            store.add_message(&chat_id, message);
        }
        Command::Edit {
            chat,
            message,
            content,
        } => {
            let chat_id = resolve_chat(store, &chat)?;
            store.update_message(&chat_id, &message, content);
        }
        Command::Forget { chat, message } => {
            let chat_id = resolve_chat(store, &chat)?;
            store.delete_message(&chat_id, &message);
        }
        Command::Delete { chat } => {
            let chat_id = resolve_chat(store, &chat)?;
            store.delete_chat(&chat_id);
        }
        Command::Clear => store.clear_chats(),
    }

    Ok(())
}

/// Accepts a full chat id or an unambiguous prefix of one.
fn resolve_chat(store: &ChatStore<BackgroundStorage>, reference: &str) -> Result<String> {
    if store.get_chat_by_id(reference).is_some() {
        return Ok(reference.to_string());
    }

    let matches: Vec<_> = store
        .chats()
        .iter()
        .filter(|chat| chat.id.starts_with(reference))
        .collect();

    match matches.as_slice() {
        [chat] => Ok(chat.id.clone()),
        [] => bail!("No chat matches `{reference}`"),
        _ => bail!("`{reference}` matches {} chats", matches.len()),
    }
}
