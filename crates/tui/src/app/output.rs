use textwrap::{wrap, Options};
use unicode_width::UnicodeWidthStr;

use crate::strings::{PREFIX_DEBUG, PREFIX_ECHO, PREFIX_SYSTEM};

use super::App;

/// Styling bucket for a line in the output pane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineClass {
    /// Server text, tagged with the server's `cls` (default `out`).
    Server(String),
    Echo,
    System,
    Error,
    Debug,
}

impl LineClass {
    pub fn from_cls(cls: Option<&str>) -> Self {
        LineClass::Server(cls.unwrap_or("out").to_string())
    }

    fn prefix(&self) -> &'static str {
        match self {
            LineClass::Server(_) => "",
            LineClass::Echo => PREFIX_ECHO,
            LineClass::System | LineClass::Error => PREFIX_SYSTEM,
            LineClass::Debug => PREFIX_DEBUG,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OutputLine {
    pub class: LineClass,
    pub text: String,
}

#[derive(Clone)]
pub struct WrappedLine {
    pub class: LineClass,
    pub rows: Vec<String>,
}

impl App {
    pub fn push_output<S: Into<String>>(&mut self, class: LineClass, text: S) {
        self.output.push(OutputLine {
            class,
            text: text.into(),
        });
        if self.output.len() > self.scrollback_limit {
            let excess = self.output.len() - self.scrollback_limit;
            self.output.drain(..excess);
            let cached = excess.min(self.output_cache.len());
            self.output_cache.drain(..cached);
        }
        self.dirty = true;
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
        self.output_cache.clear();
        self.output_total_rows = 0;
        self.output_scroll = 0;
        self.dirty = true;
    }

    pub fn ensure_output_wrapped(&mut self, width: u16) {
        let width = width.max(1);
        if self.output_wrap_width != width || self.output_cache.len() > self.output.len() {
            self.output_cache.clear();
            self.output_wrap_width = width;
        }
        let start = self.output_cache.len();
        for line in &self.output[start..] {
            self.output_cache.push(Self::wrap_line(line, width));
        }
        self.output_total_rows = self.output_cache.iter().map(|w| w.rows.len()).sum();
    }

    /// Index of the first visible row given the viewport height and the
    /// current scroll offset (rows above the bottom).
    pub fn output_first_row(&self, viewport: usize) -> usize {
        let max_scroll = self.output_total_rows.saturating_sub(viewport);
        let scroll = (self.output_scroll as usize).min(max_scroll);
        max_scroll - scroll
    }

    pub fn scroll_output_up(&mut self, rows: u16) {
        self.output_scroll = self.output_scroll.saturating_add(rows);
        let max = self
            .output_total_rows
            .saturating_sub(self.output_viewport as usize)
            .min(u16::MAX as usize) as u16;
        self.output_scroll = self.output_scroll.min(max);
        self.dirty = true;
    }

    pub fn scroll_output_down(&mut self, rows: u16) {
        self.output_scroll = self.output_scroll.saturating_sub(rows);
        self.dirty = true;
    }

    fn wrap_line(line: &OutputLine, width: u16) -> WrappedLine {
        let prefix = line.class.prefix();
        let indent = " ".repeat(UnicodeWidthStr::width(prefix));
        let mut rows = Vec::new();
        for (i, part) in line.text.split('\n').enumerate() {
            let lead = if i == 0 { prefix } else { indent.as_str() };
            let full = format!("{}{}", lead, part);
            let opts = Options::new(width as usize).subsequent_indent(&indent);
            let wrapped = wrap(&full, opts);
            if wrapped.is_empty() {
                rows.push(String::new());
            }
            rows.extend(wrapped.into_iter().map(|c| c.into_owned()));
        }
        WrappedLine {
            class: line.class.clone(),
            rows,
        }
    }
}
