use serde_json::Value;

use crate::chat::{
    format_results, Controls, ControlsState, Message, MessageId, Role, Transcript, TypingId,
    DEFAULT_TITLE,
};

/// What the chat panel shows. The send controller writes to it through
/// [`Transcript`] and [`Controls`]; `draw` reads it.
#[derive(Debug)]
pub struct ChatView {
    pub messages: Vec<Message>,
    /// Live typing indicator, if any.
    pub typing: Option<u64>,
    next_typing: u64,
    /// Error banner shown above the composer until the next keystroke.
    pub error: Option<String>,
    pub title: String,
    pub controls: ControlsState,
}

impl Default for ChatView {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            typing: None,
            next_typing: 0,
            error: None,
            title: DEFAULT_TITLE.to_string(),
            controls: ControlsState { input_enabled: true, send_enabled: false },
        }
    }
}

impl ChatView {
    pub fn new() -> Self { Self::default() }

    /// Replace the transcript with a stored conversation.
    pub fn load(&mut self, title: &str, messages: &[Message]) {
        self.messages = messages.to_vec();
        self.title = title.to_string();
        self.typing = None;
        self.error = None;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

impl Transcript for ChatView {
    fn append(&mut self, role: Role, text: &str) -> MessageId {
        self.messages.push(Message::new(role, text));
        MessageId(self.messages.len() - 1)
    }

    fn show_typing(&mut self) -> TypingId {
        self.next_typing += 1;
        self.typing = Some(self.next_typing);
        TypingId(self.next_typing)
    }

    fn remove_typing(&mut self, id: TypingId) {
        if self.typing == Some(id.0) {
            self.typing = None;
        }
    }

    fn format_results(&self, payload: &Value) -> String {
        format_results(payload)
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn show_title(&mut self, _conversation_id: &str, title: &str) {
        self.title = title.to_string();
    }
}

impl Controls for ChatView {
    fn refresh(&mut self, state: ControlsState) {
        self.controls = state;
    }
}
