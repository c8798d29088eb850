use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "New Conversation";

// ── Messages ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn label(&self) -> &str {
        match self {
            Role::User => "You",
            Role::Bot  => "Bot",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self { role, text: text.into() }
    }
}

// ── Conversations ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Names of the files the backend has processed for this conversation.
    #[serde(default)]
    pub files: Vec<String>,
    /// Unix seconds; used to order the conversation list.
    #[serde(default)]
    pub created_at: u64,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            id: id.into(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            files: Vec::new(),
            created_at,
        }
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.messages.push(Message::new(role, text));
    }

    /// Forget the attached files, e.g. after the server dropped the
    /// conversation and its uploads with it.
    pub fn clear_files(&mut self) {
        self.files.clear();
    }

    /// Record newly processed files, skipping names already attached.
    pub fn attach_files<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.files.contains(&name) {
                self.files.push(name);
            }
        }
    }
}
