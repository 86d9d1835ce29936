//! The background coordinator context.
//!
//! Keeps the last broadcast state for surfaces that open later and
//! logs the traffic it coordinates. It never drives a page itself.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use chessbridge_core_types::SessionState;
use chessbridge_message_bus::{to_mpsc, Message, MessageBus};

pub struct CoordinatorContext {
    last_state: Arc<Mutex<Option<SessionState>>>,
    cancel: CancellationToken,
}

impl CoordinatorContext {
    pub fn start(bus: Arc<MessageBus>) -> Arc<Self> {
        let last_state = Arc::new(Mutex::new(None));
        let cancel = CancellationToken::new();

        let state_slot = last_state.clone();
        let token = cancel.clone();
        let mut envelopes = to_mpsc(bus, 32);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    envelope = envelopes.recv() => {
                        let Some(envelope) = envelope else { break };
                        match &envelope.message {
                            Message::UpdateGameState { state } => {
                                info!(kind = ?state.kind, key = state.message_key, "session state");
                                *state_slot.lock() = Some(*state);
                            }
                            Message::SettingsChanged { settings } => {
                                debug!(auto_open = settings.auto_open_analysis, "settings propagated");
                            }
                            _ => {}
                        }
                    }
                }
            }
            debug!("coordinator loop ended");
        });

        Arc::new(Self { last_state, cancel })
    }

    /// Last state seen on the bus, if any broadcast has happened yet.
    pub fn last_state(&self) -> Option<SessionState> {
        *self.last_state.lock()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}
