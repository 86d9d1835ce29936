//! Cross-context broadcast of state transitions.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use chessbridge_core_types::{SessionKind, SessionState, Settings};
use chessbridge_message_bus::{Message, MessageBus};

use crate::monitor::StateSink;

/// Read-side of the settings store; the broadcaster never writes.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn current(&self) -> Settings;
}

/// Side effects fired when a session completes. One-shot per
/// transition, never a poll.
#[async_trait]
pub trait CompletionActions: Send + Sync {
    /// Begin the retrieval + analysis-open flow immediately.
    async fn open_analysis(&self);

    /// Offer the manual trigger (injected on-page affordance) instead.
    async fn show_affordance(&self);
}

/// Pushes every kind transition over the bus and, on completion,
/// either starts the analysis flow or surfaces the manual trigger
/// depending on the auto-open setting.
pub struct StateBroadcaster {
    bus: Arc<MessageBus>,
    settings: Arc<dyn SettingsSource>,
    actions: Arc<dyn CompletionActions>,
}

impl StateBroadcaster {
    pub fn new(
        bus: Arc<MessageBus>,
        settings: Arc<dyn SettingsSource>,
        actions: Arc<dyn CompletionActions>,
    ) -> Arc<Self> {
        Arc::new(Self {
            bus,
            settings,
            actions,
        })
    }
}

#[async_trait]
impl StateSink for StateBroadcaster {
    async fn on_transition(&self, state: SessionState) {
        // Best-effort push; a closed control surface is not an error.
        self.bus.publish(Message::UpdateGameState { state });

        if state.kind != SessionKind::SessionComplete {
            return;
        }

        let settings = self.settings.current().await;
        if settings.auto_open_analysis {
            info!("session complete; auto-opening analysis");
            self.actions.open_analysis().await;
        } else {
            debug!("session complete; offering manual trigger");
            self.actions.show_affordance().await;
        }
    }
}
