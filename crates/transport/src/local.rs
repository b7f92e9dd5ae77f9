//! Offline stand-in for the game runtime.
//!
//! Runs a tiny command loop on a background tokio runtime so the client can be
//! driven without a server. It speaks no network protocol; everything goes
//! through the shared [`Emitter`].

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde_json::{json, Map, Value};
use tg_core::{Emitter, Subscription, Transport, TransportError, TransportEvent};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::LocalConfig;

const PROMPT: &str = "> ";

const HELP_TEXT: &str = "Available commands:\n  look    describe the room\n  say <text>    speak\n  help    this text\n  quit    disconnect";

#[derive(Debug)]
enum Outbound {
    Connect,
    Text(String),
    Command {
        name: String,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    },
}

pub struct LocalTransport {
    emitter: Arc<Emitter>,
    tx: mpsc::UnboundedSender<Outbound>,
    connected: Arc<AtomicBool>,
}

impl LocalTransport {
    /// Spawn the background loop and connect immediately.
    pub fn start(cfg: LocalConfig) -> Self {
        let emitter = Emitter::new();
        let connected = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::unbounded_channel::<Outbound>();
        let worker = Worker {
            cfg,
            emitter: emitter.clone(),
            connected: connected.clone(),
        };
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!(target: "transport", "local runtime failed to start: {}", e);
                    return;
                }
            };
            rt.block_on(worker.run(rx));
        });
        let _ = tx.send(Outbound::Connect);
        Self {
            emitter,
            tx,
            connected,
        }
    }

    fn push(&self, msg: Outbound) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        self.tx.send(msg).map_err(|_| TransportError::Closed)
    }
}

impl Transport for LocalTransport {
    fn send_text(&self, line: &str) -> Result<(), TransportError> {
        self.push(Outbound::Text(line.to_string()))
    }

    fn send_command(
        &self,
        name: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<(), TransportError> {
        self.push(Outbound::Command {
            name: name.to_string(),
            args: args.to_vec(),
            kwargs: kwargs.clone(),
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn reconnect(&self) -> Result<(), TransportError> {
        if self.is_connected() {
            return Ok(());
        }
        self.tx
            .send(Outbound::Connect)
            .map_err(|_| TransportError::Closed)?;
        self.connected.store(true, Ordering::Release);
        info!(target: "transport", "local transport reconnected");
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        self.emitter.subscribe()
    }
}

struct Worker {
    cfg: LocalConfig,
    emitter: Arc<Emitter>,
    connected: Arc<AtomicBool>,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Outbound>) {
        while let Some(msg) = rx.recv().await {
            if !self.cfg.latency.is_zero() {
                tokio::time::sleep(self.cfg.latency).await;
            }
            match msg {
                Outbound::Connect => self.on_connect(),
                Outbound::Text(line) => self.on_text(&line),
                Outbound::Command { name, args, kwargs } => self.on_command(name, args, kwargs),
            }
        }
        debug!(target: "transport", "local transport loop finished");
    }

    fn emit(&self, ev: TransportEvent) {
        self.emitter.emit(ev);
    }

    fn on_connect(&self) {
        self.emit(TransportEvent::ConnectionOpen);
        self.emit(TransportEvent::LoggedIn);
        self.emit(TransportEvent::text(self.cfg.greeting.clone()));
        self.emit(TransportEvent::prompt(PROMPT));
    }

    fn on_text(&self, line: &str) {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((v, r)) => (v, r.trim()),
            None => (line, ""),
        };
        match verb.to_lowercase().as_str() {
            "idle" => {
                debug!(target: "transport", "idle keepalive");
                return;
            }
            "look" | "l" => {
                self.emit(TransportEvent::text(
                    "Sandbox\nA bare room with nothing in it but an echo.",
                ));
            }
            "say" if !rest.is_empty() => {
                self.emit(TransportEvent::text(format!("You say, \"{}\"", rest)));
            }
            "help" => {
                let mut kwargs = Map::new();
                kwargs.insert("type".into(), json!("help"));
                self.emit(TransportEvent::Text {
                    text: HELP_TEXT.to_string(),
                    kwargs,
                });
            }
            "quit" => {
                self.emit(TransportEvent::text("Goodbye."));
                self.connected.store(false, Ordering::Release);
                self.emit(TransportEvent::ConnectionClose);
                return;
            }
            _ => {
                let mut kwargs = Map::new();
                kwargs.insert("cls".into(), json!("err"));
                self.emit(TransportEvent::Text {
                    text: format!("Command '{}' is not available. Type \"help\" for help.", verb),
                    kwargs,
                });
            }
        }
        self.emit(TransportEvent::prompt(PROMPT));
    }

    fn on_command(&self, name: String, args: Vec<Value>, kwargs: Map<String, Value>) {
        debug!(target: "transport", "oob command {} args={} kwargs={}", name, args.len(), kwargs.len());
        if name == "webclient_options" {
            self.emit(TransportEvent::GotOptions(kwargs));
            return;
        }
        self.emit(TransportEvent::Default {
            cmd: name,
            args,
            kwargs,
        });
    }
}
