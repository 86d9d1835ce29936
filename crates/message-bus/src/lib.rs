//! Cross-context message bus.
//!
//! Each execution context (page watcher, coordinator, control
//! surface) runs its own event loop with no shared memory; the bus is
//! their only coordination channel. Delivery is best-effort and
//! asynchronous: a context that has no listener must fail silently
//! rather than raise to the sender. Requests carry a shared one-shot
//! reply slot; the first handler to respond wins.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use chessbridge_core_types::{BridgeError, SessionState, Settings};

/// Closed message vocabulary between contexts. Any future message
/// type must be added here, never sent ad hoc.
#[derive(Clone, Debug)]
pub enum Message {
    /// Pushed by the watcher on every session-kind transition.
    UpdateGameState { state: SessionState },
    /// Request: pull the current state (a surface opened mid-transition
    /// must not rely on push alone).
    GetGameState,
    /// Request: run the retrieval + analysis-open flow now.
    OpenAnalysis,
    /// Pushed after settings are persisted.
    SettingsChanged { settings: Settings },
}

/// Replies to request-shaped messages.
#[derive(Clone, Debug)]
pub enum Reply {
    GameState(SessionState),
    /// Analysis flow finished; the URL is present when the flow
    /// navigated to an imported game.
    Opened { url: Option<String> },
    Failed(BridgeError),
}

#[derive(Debug, Error)]
pub enum BusError {
    /// Nobody answered; every subscriber dropped the envelope.
    #[error("no listener answered the request")]
    NoListener,

    /// A handler exists but did not reply within the bound.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Write-once reply slot shared by all clones of a request envelope.
#[derive(Clone)]
struct ReplySlot {
    sender: Arc<Mutex<Option<oneshot::Sender<Reply>>>>,
}

impl ReplySlot {
    fn new() -> (Self, oneshot::Receiver<Reply>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    fn respond(&self, reply: Reply) -> bool {
        match self.sender.lock().take() {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }
}

/// One delivered message, with its reply slot when the sender expects
/// an answer.
#[derive(Clone)]
pub struct Envelope {
    pub message: Message,
    slot: Option<ReplySlot>,
}

impl Envelope {
    fn push(message: Message) -> Self {
        Self {
            message,
            slot: None,
        }
    }

    fn request(message: Message) -> (Self, oneshot::Receiver<Reply>) {
        let (slot, rx) = ReplySlot::new();
        (
            Self {
                message,
                slot: Some(slot),
            },
            rx,
        )
    }

    pub fn expects_reply(&self) -> bool {
        self.slot.is_some()
    }

    /// Answer the request. Returns false when the envelope was a plain
    /// push or another handler already replied.
    pub fn respond(&self, reply: Reply) -> bool {
        match &self.slot {
            Some(slot) => slot.respond(reply),
            None => false,
        }
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("message", &self.message)
            .field("expects_reply", &self.expects_reply())
            .finish()
    }
}

/// In-memory bus spanning the contexts of one process.
pub struct MessageBus {
    sender: broadcast::Sender<Envelope>,
}

impl MessageBus {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    /// Fire-and-forget send. A closed or absent listener is not an
    /// error; the message is simply dropped.
    pub fn publish(&self, message: Message) {
        let reached = self.sender.send(Envelope::push(message)).unwrap_or(0);
        if reached == 0 {
            debug!("bus publish reached no listeners");
        }
    }

    /// Send a request and await the first reply, bounded by `timeout`.
    pub async fn request(&self, message: Message, timeout: Duration) -> Result<Reply, BusError> {
        let (envelope, rx) = Envelope::request(message);
        if self.sender.send(envelope).is_err() {
            return Err(BusError::NoListener);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            // Every subscriber dropped the envelope without answering.
            Ok(Err(_)) => Err(BusError::NoListener),
            Err(_) => Err(BusError::Timeout(timeout)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }
}

/// Materialise an mpsc receiver from the bus subscription so callers
/// can await envelopes without handling broadcast lag semantics
/// directly.
pub fn to_mpsc(bus: Arc<MessageBus>, capacity: usize) -> mpsc::Receiver<Envelope> {
    let mut rx = bus.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    if tx.send(envelope).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "bus subscriber lagged; envelopes dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    out_rx
}
