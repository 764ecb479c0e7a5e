//! Text buffer behind the message input.

pub const DEFAULT_MAX_ROWS: u16 = 8;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    text: String,
    cursor: usize, // in chars
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the whole buffer, cursor at the end
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn newline(&mut self) {
        self.insert('\n');
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let char_count = self.text.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    /// Take the buffer for submission, leaving the composer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Rows the input needs at `width` columns, clamped to `1..=max_rows`.
    pub fn height(&self, width: u16, max_rows: u16) -> u16 {
        let rows = wrapped_rows(&self.text, width as usize);
        rows.clamp(1, max_rows.max(1) as usize) as u16
    }

    /// (row, column) of the cursor once the buffer is wrapped at `width`.
    pub fn cursor_position(&self, width: u16) -> (u16, u16) {
        let width = (width as usize).max(1);
        let before: String = self.text.chars().take(self.cursor).collect();
        let mut row = 0usize;
        let mut col = 0usize;
        for (i, line) in before.split('\n').enumerate() {
            if i > 0 {
                row += 1;
            }
            let chars = line.chars().count();
            row += chars / width;
            col = chars % width;
        }
        (row as u16, col as u16)
    }
}

/// Split `text` into display rows: every `\n` starts a row and long lines
/// break every `width` chars. A line that exactly fills its last row gets a
/// trailing empty row for the cursor.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        let mut start = 0;
        loop {
            let end = (start + width).min(chars.len());
            rows.push(chars[start..end].iter().collect());
            if start + width > chars.len() {
                break;
            }
            start += width;
        }
    }
    rows
}

pub fn wrapped_rows(text: &str, width: usize) -> usize {
    wrap_lines(text, width).len()
}
