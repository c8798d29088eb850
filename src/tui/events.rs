use anyhow::Result;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use serde_json::Value;
use std::{io, path::PathBuf};
use tokio::sync::mpsc;

use crate::chat::backend::UploadSummary;
use crate::chat::{HttpBackend, JsonConversationStore, KeyOutcome, PendingQuery, QueryBackend, RequestError};
use crate::config::Config;
use crate::tui::draw::draw;
use crate::tui::input::handle_composer_key;
use crate::tui::state::{App, Focus};

/// Work the key handler asks the event loop to run off the UI thread.
#[derive(Debug)]
pub enum Command {
    Query(PendingQuery),
    CreateConversation,
    Upload { conversation_id: String, paths: Vec<PathBuf> },
    Validate { conversation_id: String },
}

/// Results coming back from spawned backend calls.
#[derive(Debug)]
pub enum AppEvent {
    QueryFinished(PendingQuery, Result<Value, RequestError>),
    ConversationCreated(Result<String, RequestError>),
    FilesUploaded { conversation_id: String, outcome: Result<UploadSummary, RequestError> },
    ConversationValidated { conversation_id: String, outcome: Result<bool, RequestError> },
}

// ── Entry point ───────────────────────────────────────────────────────────────

pub async fn run(config: Config) -> Result<()> {
    let store = JsonConversationStore::open(config.conversations_path())?;
    let backend = HttpBackend::new(config.api_base_url.clone());
    tracing::info!(api = %backend.base_url(), conversations = store.len(), "starting TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    // Kitty keyboard protocol lets supporting terminals report Shift+Enter.
    let kitty_supported = execute!(
        stdout,
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
    )
    .is_ok();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend_term = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend_term)?;

    let mut app = App::new(store, backend.base_url());
    let result = event_loop(&mut terminal, &mut app, backend).await;

    disable_raw_mode()?;
    if kitty_supported {
        let _ = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags);
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    result
}

// ── Event loop ────────────────────────────────────────────────────────────────

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    backend: HttpBackend,
) -> Result<()> {
    let mut event_stream = EventStream::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    loop {
        terminal.draw(|f| draw(f, app))?;
        if app.should_quit {
            return Ok(());
        }
        if let Some(conversation_id) = app.pending_validation.take() {
            dispatch(Command::Validate { conversation_id }, &backend, &tx);
        }

        tokio::select! {
            Some(ev) = rx.recv() => handle_app_event(app, ev),

            Some(Ok(event)) = event_stream.next() => match event {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(cmd) = handle_key(app, key) {
                        dispatch(cmd, &backend, &tx);
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => scroll_up(app, 3),
                    MouseEventKind::ScrollDown => scroll_down(app, 3),
                    _ => {}
                },
                _ => {}
            },
        }
    }
}

fn dispatch(cmd: Command, backend: &HttpBackend, tx: &mpsc::UnboundedSender<AppEvent>) {
    let backend = backend.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match cmd {
            Command::Query(pending) => {
                let outcome = backend.query(&pending.conversation_id, &pending.query).await;
                AppEvent::QueryFinished(pending, outcome)
            }
            Command::CreateConversation => {
                AppEvent::ConversationCreated(backend.create_conversation().await)
            }
            Command::Upload { conversation_id, paths } => {
                let outcome = backend.upload_files(&conversation_id, paths.as_slice()).await;
                AppEvent::FilesUploaded { conversation_id, outcome }
            }
            Command::Validate { conversation_id } => {
                let outcome = backend.validate_conversation(&conversation_id).await;
                AppEvent::ConversationValidated { conversation_id, outcome }
            }
        };
        let _ = tx.send(event);
    });
}

pub fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::QueryFinished(pending, outcome) => {
            app.controller.finish_send(pending, outcome);
            app.status.clear();
        }
        AppEvent::ConversationCreated(Ok(id)) => app.add_conversation(id),
        AppEvent::ConversationCreated(Err(e)) => {
            app.status = format!("Could not create a conversation: {e}");
        }
        AppEvent::FilesUploaded { conversation_id, outcome: Ok(summary) } => {
            app.attach_files(&conversation_id, summary.all_processed_files_in_conversation);
            app.status = summary.message;
        }
        AppEvent::FilesUploaded { outcome: Err(e), .. } => {
            app.status = format!("Upload failed: {e}");
        }
        AppEvent::ConversationValidated { conversation_id, outcome: Ok(false) } => {
            app.expire_conversation(&conversation_id);
        }
        AppEvent::ConversationValidated { outcome: Ok(true), .. } => {}
        AppEvent::ConversationValidated { conversation_id, outcome: Err(e) } => {
            tracing::debug!(conversation = %conversation_id, error = %e, "could not validate conversation");
        }
    }
}

// ── Keys ──────────────────────────────────────────────────────────────────────

pub fn handle_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return None;
            }
            KeyCode::Char('n') => {
                app.status = "Creating conversation…".to_string();
                return Some(Command::CreateConversation);
            }
            KeyCode::Char('u') => {
                if app.current_conversation().is_none() {
                    app.status = "Create a conversation first (Ctrl+N)".to_string();
                } else {
                    app.upload_input.reset();
                    app.focus = Focus::UploadPath;
                }
                return None;
            }
            _ => {}
        }
    }

    match app.focus {
        Focus::UploadPath => handle_upload_key(app, key),
        Focus::Conversations => {
            match key.code {
                KeyCode::Esc => app.should_quit = true,
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Enter => app.focus = Focus::Message,
                KeyCode::Up | KeyCode::Char('k') => app.select_previous_conversation(),
                KeyCode::Down | KeyCode::Char('j') => app.select_next_conversation(),
                KeyCode::Delete | KeyCode::Char('d') => {
                    if let Some(id) = app.controller.session().current_conversation.clone() {
                        app.delete_conversation(&id);
                    }
                }
                _ => {}
            }
            None
        }
        Focus::Message => handle_message_key(app, key),
    }
}

fn handle_message_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Esc => {
            app.should_quit = true;
            return None;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.focus = Focus::Conversations;
            return None;
        }
        KeyCode::PageUp => {
            scroll_up(app, 5);
            return None;
        }
        KeyCode::PageDown => {
            scroll_down(app, 5);
            return None;
        }
        _ => {}
    }

    app.controller.view_mut().dismiss_error();
    match app.controller.on_key_down(key) {
        KeyOutcome::Send(pending) => {
            app.status = "Waiting for the server…".to_string();
            app.chat_scroll_manual = false;
            app.input_scroll = 0;
            Some(Command::Query(pending))
        }
        KeyOutcome::Suppressed => None,
        KeyOutcome::Ignored => {
            if app.controller.controls_state().input_enabled
                && handle_composer_key(&mut app.controller.session_mut().composer, key)
            {
                app.controller.on_input_changed();
            }
            None
        }
    }
}

fn handle_upload_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Esc => {
            app.upload_input.reset();
            app.focus = Focus::Message;
            None
        }
        KeyCode::Enter => {
            let paths = parse_paths(app.upload_input.text());
            app.upload_input.reset();
            app.focus = Focus::Message;
            let conversation_id = app.controller.session().current_conversation.clone()?;
            if paths.is_empty() {
                return None;
            }
            app.status = format!("Uploading {} file(s)…", paths.len());
            Some(Command::Upload { conversation_id, paths })
        }
        _ => {
            handle_composer_key(&mut app.upload_input, key);
            None
        }
    }
}

/// Comma-separated paths, with a leading `~/` expanded to the home directory.
pub fn parse_paths(input: &str) -> Vec<PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| match (p.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(p),
        })
        .collect()
}

fn scroll_up(app: &mut App, lines: u16) {
    app.chat_scroll = app.chat_scroll.saturating_sub(lines);
    app.chat_scroll_manual = true;
}

fn scroll_down(app: &mut App, lines: u16) {
    app.chat_scroll = app.chat_scroll.saturating_add(lines);
    app.chat_scroll_manual = true;
}
