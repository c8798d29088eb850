use ratatui::widgets::ListState;

use crate::chat::{
    Composer, Conversation, ConversationStore, JsonConversationStore, SendController,
    DEFAULT_TITLE,
};
use crate::tui::view::ChatView;

// ── Focus ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Conversations,
    Message,
    /// The "upload files" path prompt is open.
    UploadPath,
}

// ── App state ─────────────────────────────────────────────────────────────────

pub type ChatController = SendController<JsonConversationStore, ChatView>;

pub struct App {
    pub controller: ChatController,
    pub focus: Focus,
    pub list_state: ListState,
    pub upload_input: Composer,
    pub status: String,
    pub api_base_url: String,
    pub chat_scroll: u16,
    pub chat_scroll_manual: bool,
    pub input_scroll: u16,
    /// Conversation to check against the server on the next loop turn.
    pub pending_validation: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: JsonConversationStore, api_base_url: impl Into<String>) -> Self {
        let mut app = App {
            controller: SendController::new(store, ChatView::new()),
            focus: Focus::Message,
            list_state: ListState::default(),
            upload_input: Composer::new(),
            status: String::new(),
            api_base_url: api_base_url.into(),
            chat_scroll: 0,
            chat_scroll_manual: false,
            input_scroll: 0,
            pending_validation: None,
            should_quit: false,
        };
        if let Some(first) = app.conversation_ids().into_iter().next() {
            app.open_conversation(&first);
        }
        app.controller.refresh_controls();
        app
    }

    /// Ids in the order the conversation list shows them.
    pub fn conversation_ids(&self) -> Vec<String> {
        self.controller.store().list().into_iter().map(|c| c.id.clone()).collect()
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        let id = self.controller.session().current_conversation.as_deref()?;
        self.controller.store().get(id)
    }

    /// Switch the chat panel to `id`. Ignored while a query is in flight so
    /// the reply lands in the conversation that asked for it.
    pub fn open_conversation(&mut self, id: &str) -> bool {
        if self.controller.is_sending() {
            self.status = "Wait for the current reply before switching".to_string();
            return false;
        }
        let Some(conv) = self.controller.store().get(id) else { return false };
        let (title, messages) = (conv.title.clone(), conv.messages.clone());
        self.controller.view_mut().load(&title, &messages);
        self.controller.session_mut().current_conversation = Some(id.to_string());
        self.sync_selection();
        self.chat_scroll = 0;
        self.chat_scroll_manual = false;
        self.pending_validation = Some(id.to_string());
        true
    }

    /// Point the list highlight at the open conversation.
    fn sync_selection(&mut self) {
        let current = self.controller.session().current_conversation.clone();
        let index = current.and_then(|id| self.conversation_ids().iter().position(|c| *c == id));
        self.list_state.select(index);
    }

    pub fn select_previous_conversation(&mut self) {
        let ids = self.conversation_ids();
        if ids.is_empty() { return; }
        let i = self.list_state.selected().unwrap_or(0).saturating_sub(1);
        self.open_conversation(&ids[i]);
    }

    pub fn select_next_conversation(&mut self) {
        let ids = self.conversation_ids();
        if ids.is_empty() { return; }
        let i = self.list_state.selected().map(|i| i + 1).unwrap_or(0).min(ids.len() - 1);
        self.open_conversation(&ids[i]);
    }

    /// Add a server-created conversation and open it.
    pub fn add_conversation(&mut self, id: String) {
        self.controller.store_mut().insert(Conversation::new(id.clone()));
        self.persist();
        if !self.open_conversation(&id) {
            // Still sending: keep the current panel, the list shows the new entry.
            self.sync_selection();
            return;
        }
        self.status = "New conversation. Ctrl+U to upload an Excel file.".to_string();
    }

    /// Drop a conversation locally and open the next one in the list.
    pub fn delete_conversation(&mut self, id: &str) -> bool {
        if self.controller.is_sending() {
            self.status = "Wait for the current reply before deleting".to_string();
            return false;
        }
        if self.controller.store_mut().remove(id).is_none() {
            return false;
        }
        self.persist();
        tracing::info!(conversation = %id, "deleted conversation");

        let was_open = self.controller.session().current_conversation.as_deref() == Some(id);
        if was_open {
            self.controller.session_mut().current_conversation = None;
            self.controller.view_mut().load(DEFAULT_TITLE, &[]);
            match self.conversation_ids().into_iter().next() {
                Some(next) => {
                    self.open_conversation(&next);
                }
                None => self.list_state.select(None),
            }
            self.controller.refresh_controls();
        } else {
            self.sync_selection();
        }
        self.status = "Conversation deleted".to_string();
        true
    }

    /// The server no longer knows `id`; its uploads are gone too.
    pub fn expire_conversation(&mut self, id: &str) {
        let Some(conv) = self.controller.store_mut().get_mut(id) else { return };
        conv.clear_files();
        self.persist();
        self.controller.refresh_controls();
        self.status =
            "This conversation expired on the server. Press Ctrl+N to start a new one.".to_string();
    }

    fn persist(&mut self) {
        if let Err(e) = self.controller.store_mut().persist() {
            tracing::warn!(error = %e, "failed to persist conversations");
        }
    }

    pub fn attach_files(&mut self, id: &str, files: Vec<String>) {
        if let Some(conv) = self.controller.store_mut().get_mut(id) {
            conv.attach_files(files);
        }
        self.persist();
    }
}
