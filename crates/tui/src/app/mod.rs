use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use serde_json::{Map, Value};
use tg_core::{Subscription, Transport, TransportEvent};
use tg_transport::ClientConfig;
use tracing::{debug, info, warn};

pub mod controller;
pub mod input;
pub mod notify;
pub mod output;

use controller::{Feedback, KeyOutcome, LineInputController};
use notify::TerminalEffect;
use output::{LineClass, OutputLine, WrappedLine};

// Events handled per tick, so a flood of server text can't starve input.
const EVENTS_PER_TICK: usize = 256;

const DEFAULT_SCROLLBACK: usize = 5_000;

pub struct App {
    pub controller: LineInputController<dyn Transport>,
    transport: Arc<dyn Transport>,
    events: Subscription,
    pub config: ClientConfig,
    pub output: Vec<OutputLine>,
    pub output_cache: Vec<WrappedLine>,
    pub output_wrap_width: u16,
    pub output_total_rows: usize,
    pub output_scroll: u16,
    pub output_viewport: u16,
    pub output_area: Option<Rect>,
    pub scrollback_limit: usize,
    pub prompt: String,
    pub connected: bool,
    pub logged_in: bool,
    /// Help text routed out of the output pane.
    pub help_popup: Option<String>,
    pub show_help: bool,
    pub focused: bool,
    pub unread: usize,
    pub last_notice: Option<String>,
    effects: Vec<TerminalEffect>,
    last_idle: Instant,
    pub input_visible_lines: u16,
    pub input_max_lines: u16,
    pub should_quit: bool,
    pub dirty: bool,
}

impl App {
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let events = transport.subscribe();
        let controller = LineInputController::new(
            transport.clone(),
            config.history_capacity,
            config.reconnect_attempts,
        );
        let connected = transport.is_connected();
        let title = config.title.clone();
        Self {
            controller,
            transport,
            events,
            config,
            output: Vec::new(),
            output_cache: Vec::new(),
            output_wrap_width: 0,
            output_total_rows: 0,
            output_scroll: 0,
            output_viewport: 0,
            output_area: None,
            scrollback_limit: DEFAULT_SCROLLBACK,
            prompt: String::new(),
            connected,
            logged_in: false,
            help_popup: None,
            show_help: false,
            focused: true,
            unread: 0,
            last_notice: None,
            effects: vec![TerminalEffect::SetTitle(title)],
            last_idle: Instant::now(),
            input_visible_lines: 1,
            input_max_lines: 6,
            should_quit: false,
            dirty: true,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.dirty = true;

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d')) {
            self.should_quit = true;
            return;
        }
        if self.help_popup.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.help_popup = None;
            }
            return;
        }
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
                self.show_help = false;
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::F(1) => self.show_help = true,
            KeyCode::F(12) => {
                self.config.options.debug_enabled = !self.config.options.debug_enabled;
                let state = if self.config.options.debug_enabled { "on" } else { "off" };
                self.push_output(LineClass::System, format!("debug output {}", state));
            }
            KeyCode::Char('l') if ctrl => self.clear_output(),
            KeyCode::PageUp => {
                let step = self.output_viewport.max(1);
                self.scroll_output_up(step);
            }
            KeyCode::PageDown => {
                let step = self.output_viewport.max(1);
                self.scroll_output_down(step);
            }
            KeyCode::Up if ctrl => self.scroll_output_up(1),
            KeyCode::Down if ctrl => self.scroll_output_down(1),
            KeyCode::Home if ctrl => self.scroll_output_up(u16::MAX),
            KeyCode::End if ctrl => self.output_scroll = 0,
            _ => {
                if let KeyOutcome::Submitted(feedback) = self.controller.on_key(key) {
                    self.apply_feedback(feedback);
                    self.output_scroll = 0;
                }
            }
        }
    }

    pub fn on_paste(&mut self, text: &str) {
        self.controller.paste(text);
        self.dirty = true;
    }

    pub fn on_tick(&mut self) {
        for ev in self.events.drain(EVENTS_PER_TICK) {
            self.handle_event(ev);
        }
        if self.last_idle.elapsed() >= self.config.idle_interval {
            self.send_idle();
        }
    }

    // Keeps proxies between us and the server from dropping a quiet session.
    fn send_idle(&mut self) {
        self.last_idle = Instant::now();
        if !self.transport.is_connected() {
            return;
        }
        if let Err(e) = self.transport.send_text("idle") {
            warn!(target: "tui", "idle keepalive failed: {}", e);
        }
    }

    pub fn idle_due_in(&self) -> Duration {
        self.config
            .idle_interval
            .saturating_sub(self.last_idle.elapsed())
    }

    pub fn handle_event(&mut self, ev: TransportEvent) {
        match ev {
            TransportEvent::Text { text, kwargs } => self.on_text(text, &kwargs),
            TransportEvent::Prompt { text, .. } => {
                self.prompt = text;
                self.dirty = true;
            }
            TransportEvent::Default { cmd, args, kwargs } => {
                self.debug(format!("{} {:?} {:?}", cmd, args, kwargs));
            }
            TransportEvent::ConnectionOpen => {
                self.connected = true;
                self.debug("connection_open");
            }
            TransportEvent::ConnectionError(e) => {
                self.debug(format!("connection_error: {}", e));
            }
            TransportEvent::ConnectionClose => {
                info!(target: "tui", "connection closed");
                self.connected = false;
                self.logged_in = false;
                self.push_output(LineClass::System, crate::strings::CONNECTION_CLOSED);
            }
            TransportEvent::LoggedIn => {
                info!(target: "tui", "logged in");
                self.connected = true;
                self.logged_in = true;
                self.dirty = true;
            }
            TransportEvent::GotOptions(opts) => {
                if self.config.options.apply_server_options(&opts) {
                    info!(target: "tui", "options updated by server: {:?}", self.config.options);
                }
                self.debug(format!("webclient_options {:?}", opts));
            }
        }
    }

    fn on_text(&mut self, text: String, kwargs: &Map<String, Value>) {
        let is_help = kwargs.get("type").and_then(Value::as_str) == Some("help");
        if is_help && self.config.options.help_popup {
            self.help_popup = Some(text.clone());
        } else {
            let cls = kwargs.get("cls").and_then(Value::as_str);
            self.push_output(LineClass::from_cls(cls), text.clone());
            self.on_new_line(&text);
        }
        self.debug(format!("text {:?} {:?}", text, kwargs));
        self.dirty = true;
    }

    /// Debug payloads always go to the log; with debug enabled they are also
    /// shown in the output pane.
    pub fn debug<S: Into<String>>(&mut self, msg: S) {
        let msg = msg.into();
        debug!(target: "tui", "{}", msg);
        if self.config.options.debug_enabled {
            self.push_output(LineClass::Debug, msg);
        }
    }

    fn apply_feedback(&mut self, feedback: Vec<Feedback>) {
        for fb in feedback {
            match fb {
                Feedback::Echo(line) => self.push_output(LineClass::Echo, line),
                Feedback::Command(name) => {
                    self.push_output(LineClass::System, format!("sent command '{}'", name))
                }
                Feedback::Error(msg) => self.push_output(LineClass::Error, msg),
                Feedback::System(msg) => self.push_output(LineClass::System, msg),
            }
        }
        self.connected = self.transport.is_connected();
    }
}
