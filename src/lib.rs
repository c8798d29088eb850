pub mod chat;
pub mod config;
pub mod logging;
pub mod tui;

pub use chat::{derive_title, normalize, HttpBackend, Reply, SendController};
pub use config::Config;
pub use tui::{render_to_buffer, App, Focus};

use anyhow::{bail, Context, Result};
use chat::console::ConsoleTranscript;
use chat::{Conversation, ConversationStore, JsonConversationStore};
use std::path::PathBuf;

fn open_store(config: &Config) -> Result<JsonConversationStore> {
    JsonConversationStore::open(config.conversations_path())
}

pub async fn health(config: &Config) -> Result<()> {
    let backend = HttpBackend::new(config.api_base_url.clone());
    let health = backend
        .health()
        .await
        .with_context(|| format!("Backend at {} is not healthy", backend.base_url()))?;
    println!("Backend: {}", backend.base_url());
    println!("Status: {}", health.status);
    println!("Version: {}", health.version);
    println!("Active conversations: {}", health.active_conversations);
    Ok(())
}

/// Create a conversation on the server and remember it locally.
pub async fn new_conversation(config: &Config) -> Result<String> {
    let backend = HttpBackend::new(config.api_base_url.clone());
    let id = backend.create_conversation().await?;
    let mut store = open_store(config)?;
    store.insert(Conversation::new(id.clone()));
    store.persist()?;
    println!("{id}");
    Ok(id)
}

pub async fn upload(config: &Config, conversation_id: &str, files: &[PathBuf]) -> Result<()> {
    if files.is_empty() {
        bail!("No files given");
    }
    let mut store = open_store(config)?;
    if store.get(conversation_id).is_none() {
        store.insert(Conversation::new(conversation_id));
    }
    let backend = HttpBackend::new(config.api_base_url.clone());
    let summary = backend.upload_files(conversation_id, files).await?;
    if let Some(conv) = store.get_mut(conversation_id) {
        conv.attach_files(summary.all_processed_files_in_conversation.iter().cloned());
    }
    store.persist()?;
    println!("{}", summary.message);
    for name in &summary.uploaded_files {
        println!("- {name}");
    }
    Ok(())
}

/// Ask the server which files it has processed and sync the local record.
pub async fn files(config: &Config, conversation_id: &str) -> Result<()> {
    let backend = HttpBackend::new(config.api_base_url.clone());
    let names = backend.processed_files(conversation_id).await?;
    let mut store = open_store(config)?;
    if let Some(conv) = store.get_mut(conversation_id) {
        conv.attach_files(names.iter().cloned());
        store.persist()?;
    }
    if names.is_empty() {
        println!("No files uploaded.");
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Send one query through the same flow the TUI uses and print the reply.
pub async fn ask(config: &Config, conversation_id: &str, query: &str) -> Result<()> {
    let mut store = open_store(config)?;
    if store.get(conversation_id).is_none() {
        bail!("Unknown conversation {conversation_id}. Create one with `xlchat new`.");
    }
    let backend = HttpBackend::new(config.api_base_url.clone());
    match backend.validate_conversation(conversation_id).await {
        Ok(true) => {}
        Ok(false) => {
            if let Some(conv) = store.get_mut(conversation_id) {
                conv.clear_files();
            }
            store.persist()?;
            bail!("Conversation {conversation_id} expired on the server. Create one with `xlchat new`.");
        }
        // The send itself reports an unreachable server.
        Err(e) => tracing::warn!(error = %e, "could not validate conversation"),
    }
    let mut controller = SendController::new(store, ConsoleTranscript::default());
    {
        let session = controller.session_mut();
        session.current_conversation = Some(conversation_id.to_string());
        session.composer.insert_str(query);
    }
    if !controller.send(&backend).await && !query.trim().is_empty() {
        bail!("Query was not sent");
    }
    Ok(())
}

/// Forget a conversation locally.
pub fn delete(config: &Config, conversation_id: &str) -> Result<()> {
    let mut store = open_store(config)?;
    if store.remove(conversation_id).is_none() {
        bail!("Unknown conversation {conversation_id}");
    }
    store.persist()?;
    println!("Deleted {conversation_id}");
    Ok(())
}

pub fn list(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    if store.is_empty() {
        println!("No conversations yet.");
    }
    for conv in store.list() {
        println!(
            "{}  {}  ({} messages, {} files)",
            conv.id,
            conv.title,
            conv.messages.len(),
            conv.files.len()
        );
    }
    Ok(())
}
