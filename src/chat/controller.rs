//! The send flow: one user message in, one bot message out.
//!
//! [`SendController::begin_send`] checks the preconditions and performs the
//! synchronous half of a send; the caller dispatches the returned
//! [`PendingQuery`] and hands the outcome to [`SendController::finish_send`].
//! [`SendController::send`] does both in one linear `async` call.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::Value;

use crate::chat::backend::{QueryBackend, RequestError};
use crate::chat::composer::Composer;
use crate::chat::conversation::Role;
use crate::chat::response::{normalize, Reply};
use crate::chat::store::ConversationStore;
use crate::chat::title::derive_title;

pub const NO_FILES_ERROR: &str = "Please upload an Excel file first";
pub const APOLOGY_PREFIX: &str = "Sorry, I encountered an error while processing your query: ";

/// Messages a conversation may hold after its first exchange.
const FIRST_EXCHANGE_LEN: usize = 2;

// ── Collaborators ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub usize);

/// Handle to a typing indicator. Not `Clone`: it is consumed by
/// [`Transcript::remove_typing`].
#[derive(Debug, PartialEq, Eq)]
pub struct TypingId(pub u64);

/// The visible conversation: messages, typing indicator, errors and title.
pub trait Transcript {
    fn append(&mut self, role: Role, text: &str) -> MessageId;
    fn show_typing(&mut self) -> TypingId;
    fn remove_typing(&mut self, id: TypingId);
    /// Turn a normalized query payload into display text.
    fn format_results(&self, payload: &Value) -> String;
    fn show_error(&mut self, message: &str);
    fn show_title(&mut self, conversation_id: &str, title: &str);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlsState {
    pub input_enabled: bool,
    pub send_enabled: bool,
}

/// Enables and disables the input controls.
pub trait Controls {
    fn refresh(&mut self, state: ControlsState);
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Per-window input state: which conversation is open, whether a query is
/// in flight, and the composer.
#[derive(Debug)]
pub struct ChatSession {
    pub current_conversation: Option<String>,
    pub sending: bool,
    pub composer: Composer,
    /// Text columns available to the composer; set by the renderer.
    pub input_width: usize,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            current_conversation: None,
            sending: false,
            composer: Composer::new(),
            input_width: 60,
        }
    }
}

/// An accepted send waiting for the backend.
#[derive(Debug)]
pub struct PendingQuery {
    pub conversation_id: String,
    pub query: String,
    typing: TypingId,
}

#[derive(Debug)]
pub enum KeyOutcome {
    /// Not ours; the caller applies its normal editing.
    Ignored,
    /// Enter was swallowed without sending.
    Suppressed,
    Send(PendingQuery),
}

// ── Controller ────────────────────────────────────────────────────────────────

pub struct SendController<S, V> {
    session: ChatSession,
    store: S,
    view: V,
}

impl<S, V> SendController<S, V>
where
    S: ConversationStore,
    V: Transcript + Controls,
{
    pub fn new(store: S, view: V) -> Self {
        Self { session: ChatSession::default(), store, view }
    }

    pub fn session(&self) -> &ChatSession { &self.session }
    pub fn session_mut(&mut self) -> &mut ChatSession { &mut self.session }
    pub fn store(&self) -> &S { &self.store }
    pub fn store_mut(&mut self) -> &mut S { &mut self.store }
    pub fn view(&self) -> &V { &self.view }
    pub fn view_mut(&mut self) -> &mut V { &mut self.view }

    pub fn is_sending(&self) -> bool {
        self.session.sending
    }

    pub fn controls_state(&self) -> ControlsState {
        let idle = !self.session.sending;
        ControlsState {
            input_enabled: idle,
            send_enabled: idle && !self.session.composer.is_blank(),
        }
    }

    pub fn refresh_controls(&mut self) {
        let state = self.controls_state();
        self.view.refresh(state);
    }

    /// Grow or shrink the composer to its content, then refresh the controls.
    pub fn on_input_changed(&mut self) {
        let width = self.session.input_width;
        self.session.composer.fit_height(width);
        self.refresh_controls();
    }

    /// Enter without Shift sends (when the send control is enabled) instead
    /// of inserting a newline.
    pub fn on_key_down(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.code != KeyCode::Enter || key.modifiers.contains(KeyModifiers::SHIFT) {
            return KeyOutcome::Ignored;
        }
        if !self.controls_state().send_enabled {
            return KeyOutcome::Suppressed;
        }
        match self.begin_send() {
            Some(pending) => KeyOutcome::Send(pending),
            None => KeyOutcome::Suppressed,
        }
    }

    /// Start a send if every precondition holds. Returns `None` (doing
    /// nothing) for blank input, a send already in flight or no open
    /// conversation; a conversation without files also shows an error.
    pub fn begin_send(&mut self) -> Option<PendingQuery> {
        let query = self.session.composer.trimmed().to_string();
        if query.is_empty() || self.session.sending {
            return None;
        }
        let conversation_id = self.session.current_conversation.clone()?;
        let Some(conversation) = self.store.get(&conversation_id) else {
            tracing::warn!(conversation = %conversation_id, "selected conversation is not in the store");
            return None;
        };
        if !conversation.has_files() {
            self.view.show_error(NO_FILES_ERROR);
            return None;
        }

        self.session.sending = true;
        self.refresh_controls();
        self.append_message(&conversation_id, Role::User, &query);
        self.session.composer.reset();
        let typing = self.view.show_typing();

        tracing::info!(conversation = %conversation_id, chars = query.len(), "query accepted");
        Some(PendingQuery { conversation_id, query, typing })
    }

    /// Render the outcome of a send and return to idle. Runs exactly once per
    /// [`PendingQuery`].
    pub fn finish_send(&mut self, pending: PendingQuery, outcome: Result<Value, RequestError>) {
        let PendingQuery { conversation_id, query, typing } = pending;
        self.view.remove_typing(typing);

        let text = match outcome {
            Ok(body) => match normalize(body) {
                Reply::Format(payload) => self.view.format_results(&payload),
                Reply::Text(text) => text,
            },
            Err(e) => {
                tracing::warn!(conversation = %conversation_id, error = %e, "query failed");
                format!("{APOLOGY_PREFIX}{e}")
            }
        };
        self.append_message(&conversation_id, Role::Bot, &text);

        let first_exchange = self
            .store
            .get(&conversation_id)
            .is_some_and(|c| c.messages.len() <= FIRST_EXCHANGE_LEN);
        if first_exchange {
            let title = derive_title(&query);
            self.store.update_title(&conversation_id, &title);
            self.view.show_title(&conversation_id, &title);
        }

        self.session.sending = false;
        self.refresh_controls();
        if let Err(e) = self.store.persist() {
            tracing::warn!(error = %e, "failed to persist conversations");
        }
    }

    /// Begin, await the backend and finish in one go. Returns whether a
    /// query was actually sent.
    pub async fn send<B>(&mut self, backend: &B) -> bool
    where
        B: QueryBackend + ?Sized,
    {
        let Some(pending) = self.begin_send() else {
            return false;
        };
        let outcome = backend.query(&pending.conversation_id, &pending.query).await;
        self.finish_send(pending, outcome);
        true
    }

    /// Keep the transcript and the stored conversation in step.
    fn append_message(&mut self, conversation_id: &str, role: Role, text: &str) {
        self.view.append(role, text);
        match self.store.get_mut(conversation_id) {
            Some(conv) => conv.push(role, text),
            None => tracing::warn!(conversation = %conversation_id, "message not stored: conversation missing"),
        }
    }
}
