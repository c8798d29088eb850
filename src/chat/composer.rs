// ── Message composer ─────────────────────────────────────────────────────────

/// Rows the composer occupies when empty.
pub const MIN_COMPOSER_ROWS: u16 = 1;

/// The text the user is typing, a byte cursor and the visual height the
/// composer was last sized to.
#[derive(Clone, Debug)]
pub struct Composer {
    pub value: String,
    pub cursor: usize,
    pub rows: u16,
}

/// One screen row of a wrapped composer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WrappedRow {
    pub text: String,
    /// Column of the cursor, when it is on this row.
    pub cursor: Option<usize>,
}

impl Default for Composer {
    fn default() -> Self {
        Self { value: String::new(), cursor: 0, rows: MIN_COMPOSER_ROWS }
    }
}

impl Composer {
    pub fn new() -> Self { Self::default() }

    pub fn text(&self) -> &str { &self.value }

    pub fn trimmed(&self) -> &str { self.value.trim() }

    pub fn is_blank(&self) -> bool { self.trimmed().is_empty() }

    pub fn insert_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        self.value.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    pub fn insert_newline(&mut self) { self.insert_char('\n'); }

    pub fn delete_char_before(&mut self) {
        if self.cursor == 0 { return; }
        let prev = self.prev_boundary();
        self.value.remove(prev);
        self.cursor = prev;
    }

    pub fn delete_char_after(&mut self) {
        if self.cursor >= self.value.len() { return; }
        self.value.remove(self.cursor);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.prev_boundary();
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_home(&mut self) { self.cursor = 0; }
    pub fn move_end(&mut self) { self.cursor = self.value.len(); }

    /// Empty the text and shrink back to a single row.
    pub fn reset(&mut self) {
        self.value.clear();
        self.cursor = 0;
        self.rows = MIN_COMPOSER_ROWS;
    }

    /// Hard-wrap the text at `width` columns, one entry per screen row.
    ///
    /// The renderer draws exactly these rows, so the height and the cursor
    /// row computed from them always match what is on screen. A cursor at
    /// the end of a line takes a cell of its own.
    pub fn wrap(&self, width: usize) -> Vec<WrappedRow> {
        let width = width.max(1);
        let mut rows = Vec::new();
        let mut offset = 0;
        for line in self.value.split('\n') {
            let cursor_col = (self.cursor >= offset && self.cursor <= offset + line.len())
                .then(|| line[..self.cursor - offset].chars().count());
            let chars: Vec<char> = line.chars().collect();
            let cells = if cursor_col == Some(chars.len()) { chars.len() + 1 } else { chars.len() };
            for row in 0..cells.div_ceil(width).max(1) {
                let start = row * width;
                let end = (start + width).min(chars.len());
                rows.push(WrappedRow {
                    text: chars.get(start..end).unwrap_or_default().iter().collect(),
                    cursor: cursor_col
                        .filter(|c| (start..start + width).contains(c))
                        .map(|c| c - start),
                });
            }
            offset += line.len() + 1;
        }
        rows
    }

    /// Number of rows the composer needs at `width` columns.
    pub fn visual_rows(&self, width: usize) -> u16 {
        (self.wrap(width).len() as u16).max(MIN_COMPOSER_ROWS)
    }

    /// Resize to fit the content; there is no upper bound.
    pub fn fit_height(&mut self, width: usize) {
        self.rows = self.visual_rows(width);
    }

    /// Wrapped row the cursor sits on, used to keep it scrolled into view.
    pub fn cursor_row(&self, width: usize) -> u16 {
        self.wrap(width)
            .iter()
            .position(|row| row.cursor.is_some())
            .unwrap_or(0) as u16
    }

    fn prev_boundary(&self) -> usize {
        self.value[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}
