// Centralized UI strings and labels. ASCII-friendly by default.

use unicode_width::UnicodeWidthStr;

// Line prefixes in the output pane. Server text is shown bare.
pub const PREFIX_ECHO: &str = "| ";
pub const PREFIX_SYSTEM: &str = "* ";
pub const PREFIX_DEBUG: &str = "DEBUG MSG: ";

pub const INPUT_HINT: &str = "Type a command, Enter to send / Shift+Enter for newline";

pub const CONNECTION_CLOSED: &str = "Connection closed. Your next command will try to reconnect.";

// UI block titles (keep surrounding spaces for visual padding)
pub const TITLE_OUTPUT: &str = " Output ";
pub const TITLE_INPUT: &str = " Input ";
pub const TITLE_HELP: &str = " Help / Shortcuts ";
pub const TITLE_SERVER_HELP: &str = " Help ";

pub const STICK_BOTTOM: &str = "Bottom";

pub fn build_stick_label(scroll: u16) -> String {
    if scroll == 0 {
        STICK_BOTTOM.to_string()
    } else {
        format!("+{} lines", scroll)
    }
}

/// Everything the status bar shows, gathered from the app.
pub struct StatusInfo<'a> {
    pub connected: bool,
    pub logged_in: bool,
    pub recalling: bool,
    pub history_len: usize,
    pub unread: usize,
    pub debug: bool,
    pub stick: &'a str,
    /// Latest line received while the terminal was unfocused.
    pub notice: Option<&'a str>,
}

// Build the status bar line with width-aware compaction: segments are
// appended in order of importance until the width runs out.
pub fn build_status_line(info: &StatusInfo<'_>, max_width: u16) -> String {
    let mut segments: Vec<String> = Vec::new();
    let conn = match (info.connected, info.logged_in) {
        (true, true) => "online",
        (true, false) => "connected",
        (false, _) => "offline",
    };
    segments.push(format!("[{}][{}]", conn, info.stick));
    segments.push(format!(
        "Hist:{}{}",
        info.history_len,
        if info.recalling { " (recall)" } else { "" }
    ));
    if info.unread > 0 {
        segments.push(format!("Unread:{}", info.unread));
    }
    if info.debug {
        segments.push("DEBUG".to_string());
    }
    if let Some(notice) = info.notice {
        segments.push(format!("New: {}", notice.lines().next().unwrap_or("")));
    }
    let hints: [&str; 4] = [
        "Enter: send; Shift+Enter: newline",
        "Up/Down: history",
        "PgUp/PgDn: scroll",
        "F1: help",
    ];
    for h in hints {
        segments.push(h.to_string());
    }

    let sep = "  |  ";
    let mut out = String::new();
    let mut used = 0usize;
    for (i, seg) in segments.iter().enumerate() {
        let segw = UnicodeWidthStr::width(seg.as_str());
        let addw = segw + if i == 0 { 0 } else { UnicodeWidthStr::width(sep) };
        if used + addw > max_width as usize {
            break;
        }
        if i > 0 {
            out.push_str(sep);
            used += UnicodeWidthStr::width(sep);
        }
        out.push_str(seg);
        used += segw;
    }
    out
}

pub fn help_lines_ascii() -> &'static [&'static str] {
    &[
        "Basic",
        "  Enter: Send    Shift+Enter: Newline    Esc/Ctrl-C: Quit",
        "History",
        "  Up/Down: Recall previous/next line (caret must be at end of input)",
        "Input Editing",
        "  Arrow: Move cursor    Backspace/Delete: Delete prev/next char",
        "  Home/End: Line start/end    Ctrl+A/E: Line start/end",
        "  Ctrl+Arrow: Word move    Ctrl+W: Delete prev word",
        "  Ctrl+U/K: Kill to line start/end",
        "Output",
        "  PgUp/PgDn: Page    Ctrl+Up/Down: Fine scroll    Ctrl+Home/End: Top/bottom",
        "  Ctrl+L: Clear    F12: Toggle debug messages",
        "Commands",
        "  ##send [\"name\", [args], {kwargs}]: Send a structured command",
        "Help",
        "  F1: Open/close this panel",
    ]
}
