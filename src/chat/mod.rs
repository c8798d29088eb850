pub mod backend;
pub mod composer;
pub mod console;
pub mod controller;
pub mod conversation;
pub mod format;
pub mod response;
pub mod store;
pub mod title;

pub use backend::{HttpBackend, QueryBackend, RequestError};
pub use composer::{Composer, WrappedRow};
pub use controller::{
    ChatSession, Controls, ControlsState, KeyOutcome, MessageId, PendingQuery, SendController,
    Transcript, TypingId, APOLOGY_PREFIX, NO_FILES_ERROR,
};
pub use conversation::{Conversation, Message, Role, DEFAULT_TITLE};
pub use format::format_results;
pub use response::{normalize, QueryPayload, Reply, ResponseShape, FALLBACK_REPLY};
pub use store::{ConversationStore, JsonConversationStore};
pub use title::derive_title;
