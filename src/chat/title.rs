use regex::Regex;
use std::sync::LazyLock;

use crate::chat::conversation::DEFAULT_TITLE;

/// Title length limit, counted in UTF-16 code units.
const TITLE_MAX_UNITS: usize = 30;

// ASCII word characters only; everything else except whitespace is dropped.
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s]").expect("static title pattern"));

/// Derive a conversation title from the first user message.
///
/// The message is cut to 30 UTF-16 code units (with `...` appended when
/// cut; a character that would straddle the limit is dropped),
/// punctuation is stripped and the result trimmed. Falls back to
/// `"New Conversation"` when nothing is left.
pub fn derive_title(message: &str) -> String {
    let truncated = if message.encode_utf16().count() > TITLE_MAX_UNITS {
        let mut used = 0;
        let head: String = message
            .chars()
            .take_while(|c| {
                used += c.len_utf16();
                used <= TITLE_MAX_UNITS
            })
            .collect();
        format!("{head}...")
    } else {
        message.to_string()
    };
    let cleaned = NON_WORD.replace_all(&truncated, "");
    let title = cleaned.trim();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title.to_string()
    }
}
