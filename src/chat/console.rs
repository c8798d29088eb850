use serde_json::Value;
use std::io::{self, Write};

use crate::chat::controller::{Controls, ControlsState, MessageId, Transcript, TypingId};
use crate::chat::conversation::Role;
use crate::chat::format::format_results;

/// Transcript for one-shot CLI use: bot replies and errors go to stdout,
/// everything else is dropped.
#[derive(Debug, Default)]
pub struct ConsoleTranscript {
    appended: usize,
    next_typing: u64,
}

impl Transcript for ConsoleTranscript {
    fn append(&mut self, role: Role, text: &str) -> MessageId {
        if role == Role::Bot {
            println!("{text}");
        }
        self.appended += 1;
        MessageId(self.appended - 1)
    }

    fn show_typing(&mut self) -> TypingId {
        eprint!("…thinking\r");
        io::stderr().flush().ok();
        self.next_typing += 1;
        TypingId(self.next_typing)
    }

    fn remove_typing(&mut self, _id: TypingId) {
        eprint!("          \r");
        io::stderr().flush().ok();
    }

    fn format_results(&self, payload: &Value) -> String {
        format_results(payload)
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("Error: {message}");
    }

    fn show_title(&mut self, _conversation_id: &str, title: &str) {
        eprintln!("Conversation titled \"{title}\"");
    }
}

impl Controls for ConsoleTranscript {
    fn refresh(&mut self, _state: ControlsState) {}
}
