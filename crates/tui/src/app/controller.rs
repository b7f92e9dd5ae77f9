use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tg_core::{classify, split_lines, HistoryBuffer, Submission, Transport, TransportError};
use tracing::{info, warn};

use super::input::InputLine;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecallDirection {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditState {
    Composing,
    Recalling,
}

/// What the output pane should show after a submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Feedback {
    /// A text line handed to the transport.
    Echo(String),
    /// A structured command handed to the transport.
    Command(String),
    /// The line could not be parsed and was kept in the field.
    Error(String),
    /// The line could not be delivered.
    System(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Submitted(Vec<Feedback>),
    Handled,
    Ignored,
}

/// Owns the input field and its recall history, and forwards finished lines
/// to the transport.
pub struct LineInputController<T: Transport + ?Sized> {
    input: InputLine,
    history: HistoryBuffer,
    transport: Arc<T>,
    reconnect_attempts: u32,
}

impl<T: Transport + ?Sized> LineInputController<T> {
    pub fn new(transport: Arc<T>, history_capacity: usize, reconnect_attempts: u32) -> Self {
        Self {
            input: InputLine::default(),
            history: HistoryBuffer::new(history_capacity),
            transport,
            reconnect_attempts,
        }
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn state(&self) -> EditState {
        if self.history.is_recalling() {
            EditState::Recalling
        } else {
            EditState::Composing
        }
    }

    /// Apply an edit to the field. Any edit leaves recall mode.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut InputLine) -> R) -> R {
        let r = f(&mut self.input);
        self.history.end();
        r
    }

    /// Send every line of the field, in order.
    pub fn on_submit(&mut self) -> Vec<Feedback> {
        let text = self.input.text().to_string();
        let mut out = Vec::new();
        let mut rejected: Vec<&str> = Vec::new();

        for line in split_lines(&text) {
            match classify(line) {
                Ok(Submission::Command(cmd)) => {
                    let sent =
                        self.deliver(|t| t.send_command(&cmd.name, &cmd.args, &cmd.kwargs));
                    match sent {
                        Ok(()) => out.push(Feedback::Command(cmd.name)),
                        Err(e) => out.push(Feedback::System(format!(
                            "command '{}' not sent: {}",
                            cmd.name, e
                        ))),
                    }
                }
                Ok(Submission::Text(line)) => {
                    self.history.add(line);
                    match self.deliver(|t| t.send_text(line)) {
                        Ok(()) => out.push(Feedback::Echo(line.to_string())),
                        Err(e) => out.push(Feedback::System(format!("not sent ({}): {}", e, line))),
                    }
                }
                Err(e) => {
                    warn!(target: "tui", "rejected command line: {}", e);
                    out.push(Feedback::Error(format!("{}: {}", e, line)));
                    rejected.push(line);
                }
            }
        }

        if rejected.is_empty() {
            self.input.clear();
        } else {
            self.input.set_text(rejected.join("\n"));
        }
        self.history.end();
        out
    }

    /// Walk the history. Only acts when the caret sits at the end of the text,
    /// so edits in the middle of a line are never overwritten.
    pub fn on_recall_key(&mut self, dir: RecallDirection) -> bool {
        if !self.input.caret_at_end() {
            return false;
        }
        if !self.history.is_recalling() {
            self.history.scratch(self.input.text());
        }
        let entry = match dir {
            RecallDirection::Up => self.history.back(),
            RecallDirection::Down => self.history.fwd(),
        }
        .to_string();
        self.input.set_text(entry);
        true
    }

    /// Enter submits; Shift+Enter or Alt+Enter inserts a literal newline.
    pub fn on_submit_key(&mut self, key: KeyEvent) -> Option<Vec<Feedback>> {
        if key.code != KeyCode::Enter {
            return None;
        }
        if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
            self.edit(|l| l.insert_text("\n"));
            return None;
        }
        info!(target: "tui", "submit: input_len={}", self.input.text().len());
        Some(self.on_submit())
    }

    pub fn on_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => match self.on_submit_key(key) {
                Some(fb) => KeyOutcome::Submitted(fb),
                None => KeyOutcome::Handled,
            },
            KeyCode::Up if key.modifiers.is_empty() => {
                recall_outcome(self.on_recall_key(RecallDirection::Up))
            }
            KeyCode::Down if key.modifiers.is_empty() => {
                recall_outcome(self.on_recall_key(RecallDirection::Down))
            }
            KeyCode::Char('w') if ctrl => self.handled(InputLine::delete_prev_word),
            KeyCode::Char('u') if ctrl => self.handled(InputLine::kill_to_line_start),
            KeyCode::Char('k') if ctrl => self.handled(InputLine::kill_to_line_end),
            KeyCode::Char('a') if ctrl => self.handled(InputLine::move_line_start),
            KeyCode::Char('e') if ctrl => self.handled(InputLine::move_line_end),
            KeyCode::Char(_) if ctrl => KeyOutcome::Ignored,
            KeyCode::Char(ch) => {
                let mut buf = [0u8; 4];
                let s = ch.encode_utf8(&mut buf);
                self.edit(|l| l.insert_text(s));
                KeyOutcome::Handled
            }
            KeyCode::Backspace => self.handled(InputLine::delete_left),
            KeyCode::Delete => self.handled(InputLine::delete_right),
            KeyCode::Left if ctrl => self.handled(InputLine::move_word_left),
            KeyCode::Right if ctrl => self.handled(InputLine::move_word_right),
            KeyCode::Left => self.handled(InputLine::move_left),
            KeyCode::Right => self.handled(InputLine::move_right),
            KeyCode::Home => self.handled(InputLine::move_line_start),
            KeyCode::End => self.handled(InputLine::move_line_end),
            _ => KeyOutcome::Ignored,
        }
    }

    /// Insert pasted text at the caret.
    pub fn paste(&mut self, text: &str) {
        self.edit(|l| l.insert_text(text));
    }

    fn handled(&mut self, f: fn(&mut InputLine)) -> KeyOutcome {
        self.edit(f);
        KeyOutcome::Handled
    }

    fn deliver(
        &self,
        send: impl FnOnce(&T) -> Result<(), TransportError>,
    ) -> Result<(), TransportError> {
        self.ensure_connected()?;
        send(&*self.transport)
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.transport.is_connected() {
            return Ok(());
        }
        for attempt in 1..=self.reconnect_attempts {
            match self.transport.reconnect() {
                Ok(()) if self.transport.is_connected() => {
                    info!(target: "tui", "reconnected on attempt {}", attempt);
                    return Ok(());
                }
                Ok(()) => {}
                Err(e) => warn!(target: "tui", "reconnect attempt {} failed: {}", attempt, e),
            }
        }
        Err(TransportError::NotConnected)
    }
}

fn recall_outcome(acted: bool) -> KeyOutcome {
    if acted {
        KeyOutcome::Handled
    } else {
        KeyOutcome::Ignored
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use std::sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Mutex,
    };
    use tg_core::{Emitter, Subscription};

    #[derive(Debug, Clone, PartialEq)]
    pub enum Sent {
        Text(String),
        Command(String, Vec<Value>, Map<String, Value>),
    }

    /// Records everything handed to it.
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<Sent>>,
        pub connected: AtomicBool,
        pub reconnect_works: AtomicBool,
        pub reconnects: AtomicU32,
        pub emitter: Arc<Emitter>,
    }

    impl RecordingTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                connected: AtomicBool::new(true),
                reconnect_works: AtomicBool::new(true),
                reconnects: AtomicU32::new(0),
                emitter: Emitter::new(),
            })
        }

        pub fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        fn send_text(&self, line: &str) -> Result<(), TransportError> {
            if !self.is_connected() {
                return Err(TransportError::NotConnected);
            }
            self.sent.lock().unwrap().push(Sent::Text(line.to_string()));
            Ok(())
        }

        fn send_command(
            &self,
            name: &str,
            args: &[Value],
            kwargs: &Map<String, Value>,
        ) -> Result<(), TransportError> {
            if !self.is_connected() {
                return Err(TransportError::NotConnected);
            }
            self.sent.lock().unwrap().push(Sent::Command(
                name.to_string(),
                args.to_vec(),
                kwargs.clone(),
            ));
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn reconnect(&self) -> Result<(), TransportError> {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
            if self.reconnect_works.load(Ordering::SeqCst) {
                self.connected.store(true, Ordering::SeqCst);
                Ok(())
            } else {
                Err(TransportError::Rejected("server down".into()))
            }
        }

        fn subscribe(&self) -> Subscription {
            self.emitter.subscribe()
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn controller() -> (Arc<RecordingTransport>, LineInputController<RecordingTransport>) {
        let t = RecordingTransport::new();
        let c = LineInputController::new(t.clone(), 21, 2);
        (t, c)
    }

    fn type_text(c: &mut LineInputController<RecordingTransport>, s: &str) {
        for ch in s.chars() {
            c.on_key(key(KeyCode::Char(ch)));
        }
    }

    fn submit(c: &mut LineInputController<RecordingTransport>, s: &str) -> Vec<Feedback> {
        type_text(c, s);
        match c.on_key(key(KeyCode::Enter)) {
            KeyOutcome::Submitted(fb) => fb,
            other => panic!("enter did not submit: {:?}", other),
        }
    }

    #[test]
    fn enter_sends_and_records() {
        let (t, mut c) = controller();
        let fb = submit(&mut c, "look");
        assert_eq!(fb, vec![Feedback::Echo("look".into())]);
        assert_eq!(t.sent(), vec![Sent::Text("look".into())]);
        assert!(c.input().is_empty());
        assert_eq!(c.history().last_committed(), Some("look"));
    }

    #[test]
    fn oob_line_bypasses_history() {
        let (t, mut c) = controller();
        let fb = submit(&mut c, r#"##send ["pose",["waves"],{}]"#);
        assert_eq!(fb, vec![Feedback::Command("pose".into())]);
        assert_eq!(
            t.sent(),
            vec![Sent::Command("pose".into(), vec![json!("waves")], Map::new())]
        );
        assert_eq!(c.history().committed_len(), 0);
        assert!(c.input().is_empty());
    }

    #[test]
    fn malformed_oob_is_reported_and_kept() {
        let (t, mut c) = controller();
        let fb = submit(&mut c, "##send [oops");
        assert!(matches!(fb.as_slice(), [Feedback::Error(_)]));
        assert!(t.sent().is_empty());
        assert_eq!(c.input().text(), "##send [oops");
        assert_eq!(c.history().committed_len(), 0);
    }

    #[test]
    fn multi_line_paste_sends_each_line() {
        let (t, mut c) = controller();
        c.paste("north\r\n\r\neast\n##send [\"map\",[],{}]\nsay done");
        let fb = c.on_submit();
        assert_eq!(fb.len(), 4);
        assert_eq!(
            t.sent(),
            vec![
                Sent::Text("north".into()),
                Sent::Text("east".into()),
                Sent::Command("map".into(), vec![], Map::new()),
                Sent::Text("say done".into()),
            ]
        );
        let hist: Vec<&str> = c.history().iter_committed().collect();
        assert_eq!(hist, vec!["north", "east", "say done"]);
    }

    #[test]
    fn duplicates_are_still_sent() {
        let (t, mut c) = controller();
        submit(&mut c, "look");
        submit(&mut c, "look");
        assert_eq!(t.sent().len(), 2);
        assert_eq!(c.history().committed_len(), 1);
    }

    #[test]
    fn shift_enter_inserts_newline() {
        let (t, mut c) = controller();
        type_text(&mut c, "a");
        let out = c.on_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        assert_eq!(out, KeyOutcome::Handled);
        type_text(&mut c, "b");
        assert_eq!(c.input().text(), "a\nb");
        assert!(t.sent().is_empty());
    }

    #[test]
    fn up_and_down_walk_history() {
        let (_t, mut c) = controller();
        submit(&mut c, "look");
        submit(&mut c, "north");
        type_text(&mut c, "dra");

        assert_eq!(c.on_key(key(KeyCode::Up)), KeyOutcome::Handled);
        assert_eq!(c.input().text(), "north");
        assert_eq!(c.state(), EditState::Recalling);
        c.on_key(key(KeyCode::Up));
        assert_eq!(c.input().text(), "look");
        c.on_key(key(KeyCode::Up));
        assert_eq!(c.input().text(), "look");

        c.on_key(key(KeyCode::Down));
        assert_eq!(c.input().text(), "north");
        c.on_key(key(KeyCode::Down));
        assert_eq!(c.input().text(), "dra");
        assert_eq!(c.state(), EditState::Composing);
    }

    #[test]
    fn down_while_composing_keeps_text() {
        let (_t, mut c) = controller();
        submit(&mut c, "look");
        type_text(&mut c, "say hi");
        c.on_key(key(KeyCode::Down));
        assert_eq!(c.input().text(), "say hi");
    }

    #[test]
    fn recall_ignored_when_caret_not_at_end() {
        let (_t, mut c) = controller();
        submit(&mut c, "look");
        type_text(&mut c, "north");
        c.on_key(key(KeyCode::Left));
        assert_eq!(c.on_key(key(KeyCode::Down)), KeyOutcome::Ignored);
        assert_eq!(c.on_key(key(KeyCode::Up)), KeyOutcome::Ignored);
        assert_eq!(c.input().text(), "north");
        assert_eq!(c.state(), EditState::Composing);
    }

    #[test]
    fn editing_a_recalled_line_returns_to_composing() {
        let (t, mut c) = controller();
        submit(&mut c, "say hello");
        c.on_key(key(KeyCode::Up));
        type_text(&mut c, "!");
        assert_eq!(c.state(), EditState::Composing);
        assert_eq!(c.input().text(), "say hello!");
        c.on_key(key(KeyCode::Up));
        assert_eq!(c.input().text(), "say hello");
        c.on_key(key(KeyCode::Down));
        assert_eq!(c.input().text(), "say hello!");
        c.on_key(key(KeyCode::Enter));
        assert_eq!(t.sent().last(), Some(&Sent::Text("say hello!".into())));
    }

    #[test]
    fn reconnects_before_sending() {
        let (t, mut c) = controller();
        t.connected.store(false, Ordering::SeqCst);
        let fb = submit(&mut c, "look");
        assert_eq!(fb, vec![Feedback::Echo("look".into())]);
        assert_eq!(t.reconnects.load(Ordering::SeqCst), 1);
        assert_eq!(t.sent(), vec![Sent::Text("look".into())]);
    }

    #[test]
    fn failed_reconnect_surfaces_system_message() {
        let (t, mut c) = controller();
        t.connected.store(false, Ordering::SeqCst);
        t.reconnect_works.store(false, Ordering::SeqCst);
        let fb = submit(&mut c, "look");
        assert!(matches!(fb.as_slice(), [Feedback::System(_)]));
        assert_eq!(t.reconnects.load(Ordering::SeqCst), 2);
        assert!(t.sent().is_empty());
        assert!(c.input().is_empty());
    }

    #[test]
    fn empty_submit_sends_nothing() {
        let (t, mut c) = controller();
        let fb = submit(&mut c, "");
        assert!(fb.is_empty());
        assert!(t.sent().is_empty());
    }
}
