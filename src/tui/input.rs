use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::chat::Composer;

// ── Composer key handler ──────────────────────────────────────────────────────

/// Apply an editing key to the composer. Returns true when the text changed.
///
/// Plain Enter is not handled here; the send controller decides what it does.
/// Shift+Enter and Ctrl+J insert a newline (Ctrl+J for terminals that cannot
/// report Shift+Enter).
pub fn handle_composer_key(composer: &mut Composer, key: KeyEvent) -> bool {
    let before = composer.value.len();
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => composer.insert_newline(),
        KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            composer.insert_newline()
        }
        KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
        KeyCode::Char(c) => composer.insert_char(c),
        KeyCode::Backspace => composer.delete_char_before(),
        KeyCode::Delete => composer.delete_char_after(),
        KeyCode::Left => composer.move_left(),
        KeyCode::Right => composer.move_right(),
        KeyCode::Home => composer.move_home(),
        KeyCode::End => composer.move_end(),
        _ => {}
    }
    composer.value.len() != before
}
