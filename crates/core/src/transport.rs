use std::sync::{
    mpsc::{self, Receiver, Sender, TryRecvError},
    Arc, Mutex, MutexGuard, Weak,
};
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Events the runtime pushes to the front-end.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    Text {
        text: String,
        kwargs: Map<String, Value>,
    },
    Prompt {
        text: String,
        kwargs: Map<String, Value>,
    },
    /// A server command with no dedicated event.
    Default {
        cmd: String,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    },
    ConnectionOpen,
    ConnectionClose,
    ConnectionError(String),
    LoggedIn,
    GotOptions(Map<String, Value>),
}

impl TransportEvent {
    pub fn text<S: Into<String>>(s: S) -> Self {
        TransportEvent::Text {
            text: s.into(),
            kwargs: Map::new(),
        }
    }

    pub fn prompt<S: Into<String>>(s: S) -> Self {
        TransportEvent::Prompt {
            text: s.into(),
            kwargs: Map::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransportEvent::Text { .. } => "text",
            TransportEvent::Prompt { .. } => "prompt",
            TransportEvent::Default { .. } => "default",
            TransportEvent::ConnectionOpen => "connection_open",
            TransportEvent::ConnectionClose => "connection_close",
            TransportEvent::ConnectionError(_) => "connection_error",
            TransportEvent::LoggedIn => "logged_in",
            TransportEvent::GotOptions(_) => "webclient_options",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,
    #[error("transport closed")]
    Closed,
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Connection to the game runtime. Sends are fire-and-forget: `Ok` means the
/// message was handed off, not that the server processed it.
pub trait Transport: Send + Sync {
    fn send_text(&self, line: &str) -> Result<(), TransportError>;
    fn send_command(
        &self,
        name: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<(), TransportError>;
    fn is_connected(&self) -> bool;
    fn reconnect(&self) -> Result<(), TransportError>;
    fn subscribe(&self) -> Subscription;
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    senders: Vec<(u64, Sender<TransportEvent>)>,
}

/// Fans transport events out to every live subscription.
#[derive(Default)]
pub struct Emitter {
    inner: Mutex<Subscribers>,
}

impl Emitter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let mut subs = self.lock();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.senders.push((id, tx));
        debug!(target: "core", "subscribe id={} live={}", id, subs.senders.len());
        Subscription {
            id,
            rx,
            emitter: Arc::downgrade(self),
        }
    }

    pub fn emit(&self, event: TransportEvent) {
        let mut subs = self.lock();
        subs.senders.retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().senders.len()
    }

    fn unsubscribe(&self, id: u64) {
        let mut subs = self.lock();
        subs.senders.retain(|(sid, _)| *sid != id);
        debug!(target: "core", "unsubscribe id={} live={}", id, subs.senders.len());
    }
}

/// A live registration with an [`Emitter`]. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    rx: Receiver<TransportEvent>,
    emitter: Weak<Emitter>,
}

impl Subscription {
    pub fn try_next(&self) -> Option<TransportEvent> {
        match self.rx.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Block for at most `timeout` waiting for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> Option<TransportEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Collect up to `max` pending events without blocking.
    pub fn drain(&self, max: usize) -> Vec<TransportEvent> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.try_next() {
                Some(ev) => out.push(ev),
                None => break,
            }
        }
        out
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(emitter) = self.emitter.upgrade() {
            emitter.unsubscribe(self.id);
        }
    }
}
