use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::chat::conversation::Conversation;

/// Conversation records the send controller reads and appends to.
pub trait ConversationStore {
    fn get(&self, id: &str) -> Option<&Conversation>;
    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation>;
    fn update_title(&mut self, id: &str, title: &str);
    /// Write every conversation to durable storage.
    fn persist(&mut self) -> Result<()>;
    /// Conversations in display order.
    fn list(&self) -> Vec<&Conversation>;
}

// ── JSON file store ───────────────────────────────────────────────────────────

/// All conversations kept in memory and rewritten to a single JSON file.
#[derive(Debug, Default)]
pub struct JsonConversationStore {
    path: Option<PathBuf>,
    conversations: HashMap<String, Conversation>,
}

impl JsonConversationStore {
    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load `path` if it exists; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let conversations = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let list: Vec<Conversation> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            list.into_iter().map(|c| (c.id.clone(), c)).collect()
        } else {
            HashMap::new()
        };
        tracing::debug!(path = %path.display(), count = conversations.len(), "opened conversation store");
        Ok(Self { path: Some(path), conversations })
    }

    pub fn insert(&mut self, conversation: Conversation) {
        self.conversations.insert(conversation.id.clone(), conversation);
    }

    pub fn remove(&mut self, id: &str) -> Option<Conversation> {
        self.conversations.remove(id)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

impl ConversationStore for JsonConversationStore {
    fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.get_mut(id)
    }

    fn update_title(&mut self, id: &str, title: &str) {
        if let Some(conv) = self.conversations.get_mut(id) {
            conv.title = title.to_string();
        }
    }

    fn persist(&mut self) -> Result<()> {
        let Some(path) = &self.path else { return Ok(()) };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let list = self.list();
        let content = serde_json::to_string_pretty(&list)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Newest first; ties broken by id so the order is stable.
    fn list(&self) -> Vec<&Conversation> {
        let mut list: Vec<&Conversation> = self.conversations.values().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        list
    }
}
