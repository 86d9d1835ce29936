//! The page-watcher context.
//!
//! Runs against the source page: monitors mutations, broadcasts
//! state transitions, and answers pull requests from the other
//! contexts. Replies flow back through the envelope; a flow failure
//! is a reply, not a crash.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use chessbridge_message_bus::{to_mpsc, Message, MessageBus, Reply};
use chessbridge_page_probe::PageDriver;
use chessbridge_state_watch::{
    ChangeMonitor, CompletionActions, SettingsSource, StateBroadcaster,
};

use crate::affordance;
use crate::flow::AnalysisOpener;

/// Completion side effects wired to this watcher's page.
struct WatcherActions {
    driver: Arc<dyn PageDriver>,
    opener: Arc<AnalysisOpener>,
}

#[async_trait]
impl CompletionActions for WatcherActions {
    async fn open_analysis(&self) {
        if let Err(err) = self.opener.run().await {
            warn!(error = %err, "auto-open flow failed");
        }
    }

    async fn show_affordance(&self) {
        affordance::inject(self.driver.as_ref()).await;
    }
}

/// The watcher context: one per source page.
pub struct WatcherContext {
    monitor: Arc<ChangeMonitor>,
    cancel: CancellationToken,
}

impl WatcherContext {
    /// Start monitoring and begin answering bus requests.
    pub async fn start(
        driver: Arc<dyn PageDriver>,
        bus: Arc<MessageBus>,
        settings: Arc<dyn SettingsSource>,
        opener: Arc<AnalysisOpener>,
    ) -> Arc<Self> {
        let actions = Arc::new(WatcherActions {
            driver: driver.clone(),
            opener: opener.clone(),
        });
        let broadcaster = StateBroadcaster::new(bus.clone(), settings, actions);
        let monitor = ChangeMonitor::new(driver, broadcaster);
        monitor.start().await;

        let cancel = CancellationToken::new();
        let context = Arc::new(Self {
            monitor: monitor.clone(),
            cancel: cancel.clone(),
        });

        let mut envelopes = to_mpsc(bus, 32);
        let handler_monitor = monitor;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    envelope = envelopes.recv() => {
                        let Some(envelope) = envelope else { break };
                        match &envelope.message {
                            Message::GetGameState => {
                                let state = handler_monitor.check_now().await;
                                envelope.respond(Reply::GameState(state));
                            }
                            Message::OpenAnalysis => {
                                match opener.run().await {
                                    Ok(url) => {
                                        envelope.respond(Reply::Opened { url: Some(url) });
                                    }
                                    Err(err) => {
                                        warn!(error = %err, "requested flow failed");
                                        envelope.respond(Reply::Failed(err));
                                    }
                                }
                            }
                            Message::SettingsChanged { settings } => {
                                debug!(auto_open = settings.auto_open_analysis, "settings changed");
                            }
                            Message::UpdateGameState { .. } => {}
                        }
                    }
                }
            }
            debug!("watcher request loop ended");
        });

        context
    }

    pub fn monitor(&self) -> Arc<ChangeMonitor> {
        self.monitor.clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
        self.monitor.stop();
    }
}
