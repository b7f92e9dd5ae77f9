use unicode_segmentation::UnicodeSegmentation;

/// Editable input field: text plus a caret counted in grapheme clusters.
#[derive(Clone, Debug, Default)]
pub struct InputLine {
    text: String,
    cursor: usize,
}

impl InputLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn grapheme_len(&self) -> usize {
        self.text.graphemes(true).count()
    }

    pub fn caret_at_end(&self) -> bool {
        self.cursor >= self.grapheme_len()
    }

    /// Replace the whole text and park the caret at the end.
    pub fn set_text<S: Into<String>>(&mut self, s: S) {
        self.text = s.into();
        self.cursor = self.grapheme_len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert_text(&mut self, s: &str) {
        let parts: Vec<&str> = self.text.graphemes(true).collect();
        let idx = self.cursor.min(parts.len());
        let mut new_text = String::with_capacity(self.text.len() + s.len());
        for g in &parts[..idx] {
            new_text.push_str(g);
        }
        new_text.push_str(s);
        for g in &parts[idx..] {
            new_text.push_str(g);
        }
        self.text = new_text;
        let added = s.graphemes(true).count();
        self.cursor = (idx + added).min(self.grapheme_len());
    }

    pub fn delete_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut parts: Vec<&str> = self.text.graphemes(true).collect();
        let idx = self.cursor.min(parts.len());
        parts.remove(idx - 1);
        self.text = parts.concat();
        self.cursor = idx - 1;
    }

    pub fn delete_right(&mut self) {
        let mut parts: Vec<&str> = self.text.graphemes(true).collect();
        let idx = self.cursor.min(parts.len());
        if idx < parts.len() {
            parts.remove(idx);
            self.text = parts.concat();
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.grapheme_len() {
            self.cursor += 1;
        }
    }

    pub fn move_line_start(&mut self) {
        self.cursor = self.line_start();
    }

    pub fn move_line_end(&mut self) {
        self.cursor = self.line_end();
    }

    pub fn move_word_left(&mut self) {
        self.cursor = self.prev_word_boundary();
    }

    pub fn move_word_right(&mut self) {
        let parts: Vec<&str> = self.text.graphemes(true).collect();
        let mut i = self.cursor.min(parts.len());
        while i < parts.len() && parts[i].trim().is_empty() {
            i += 1;
        }
        while i < parts.len() && !parts[i].trim().is_empty() {
            i += 1;
        }
        self.cursor = i;
    }

    pub fn delete_prev_word(&mut self) {
        let start = self.prev_word_boundary();
        self.remove_range(start, self.cursor);
        self.cursor = start;
    }

    pub fn kill_to_line_start(&mut self) {
        let start = self.line_start();
        self.remove_range(start, self.cursor);
        self.cursor = start;
    }

    pub fn kill_to_line_end(&mut self) {
        let end = self.line_end();
        self.remove_range(self.cursor, end);
    }

    fn line_start(&self) -> usize {
        let parts: Vec<&str> = self.text.graphemes(true).collect();
        let mut i = self.cursor.min(parts.len());
        while i > 0 && parts[i - 1] != "\n" {
            i -= 1;
        }
        i
    }

    fn line_end(&self) -> usize {
        let parts: Vec<&str> = self.text.graphemes(true).collect();
        let mut i = self.cursor.min(parts.len());
        while i < parts.len() && parts[i] != "\n" {
            i += 1;
        }
        i
    }

    fn prev_word_boundary(&self) -> usize {
        let parts: Vec<&str> = self.text.graphemes(true).collect();
        let mut i = self.cursor.min(parts.len());
        while i > 0 && parts[i - 1].trim().is_empty() {
            i -= 1;
        }
        while i > 0 && !parts[i - 1].trim().is_empty() {
            i -= 1;
        }
        i
    }

    fn remove_range(&mut self, start: usize, end: usize) {
        let mut parts: Vec<&str> = self.text.graphemes(true).collect();
        let end = end.min(parts.len());
        if start >= end {
            return;
        }
        parts.drain(start..end);
        self.text = parts.concat();
    }
}
