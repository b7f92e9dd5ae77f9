use std::collections::VecDeque;

/// Number of slots kept by default, scratch slot included.
pub const DEFAULT_CAPACITY: usize = 21;

// One committed line plus the scratch slot.
const MIN_CAPACITY: usize = 2;

/// Bounded recall history for a single input line.
///
/// The last entry is always the scratch slot holding the line being composed.
/// `cursor` counts backwards from the scratch slot: 0 means "not recalling".
#[derive(Clone, Debug)]
pub struct HistoryBuffer {
    entries: VecDeque<String>,
    cursor: usize,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        let mut entries = VecDeque::with_capacity(capacity + 1);
        entries.push_back(String::new());
        Self {
            entries,
            cursor: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_recalling(&self) -> bool {
        self.cursor > 0
    }

    /// Number of committed lines (the scratch slot is not counted).
    pub fn committed_len(&self) -> usize {
        self.entries.len() - 1
    }

    /// The entry immediately before the scratch slot.
    pub fn last_committed(&self) -> Option<&str> {
        let n = self.entries.len();
        if n < 2 {
            return None;
        }
        self.entries.get(n - 2).map(String::as_str)
    }

    /// Committed lines, oldest first.
    pub fn iter_committed(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .take(self.committed_len())
            .map(String::as_str)
    }

    /// Commit a submitted line and leave recall mode.
    ///
    /// Empty lines and immediate repeats of the last committed line only reset
    /// the cursor. Whatever sat in the scratch slot is replaced by `line`.
    pub fn add(&mut self, line: &str) {
        if !line.is_empty() && self.last_committed() != Some(line) {
            if let Some(slot) = self.entries.back_mut() {
                slot.clear();
                slot.push_str(line);
            }
            self.entries.push_back(String::new());
            while self.entries.len() > self.capacity {
                self.entries.pop_front();
            }
        }
        self.cursor = 0;
    }

    /// Step one entry into the past. Saturates at the oldest entry.
    pub fn back(&mut self) -> &str {
        self.cursor = (self.cursor + 1).min(self.entries.len() - 1);
        self.at_cursor()
    }

    /// Step one entry towards the present. Saturates at the scratch slot.
    pub fn fwd(&mut self) -> &str {
        self.cursor = self.cursor.saturating_sub(1);
        self.at_cursor()
    }

    /// Leave recall mode and return the scratch slot.
    pub fn end(&mut self) -> &str {
        self.cursor = 0;
        self.at_cursor()
    }

    /// Overwrite the scratch slot without adding an entry.
    pub fn scratch(&mut self, text: &str) {
        if let Some(slot) = self.entries.back_mut() {
            slot.clear();
            slot.push_str(text);
        }
    }

    fn at_cursor(&self) -> &str {
        let idx = self.entries.len() - 1 - self.cursor;
        self.entries.get(idx).map(String::as_str).unwrap_or("")
    }
}
