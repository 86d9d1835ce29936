//! Mutation-driven state monitoring.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use chessbridge_core_types::{SessionKind, SessionState};
use chessbridge_page_probe::{MutationNotice, PageDriver, PageFacts};

use crate::detector::detect;

/// Downstream consumer of kind transitions.
#[async_trait]
pub trait StateSink: Send + Sync {
    async fn on_transition(&self, state: SessionState);
}

/// Watches one document's mutation feed and forwards state changes.
///
/// Holds the last broadcast kind; a detection pass that lands on the
/// same kind is not a transition and is never forwarded. Safe to
/// re-initialize: `start` drops any previous subscription before
/// creating a new one.
pub struct ChangeMonitor {
    driver: Arc<dyn PageDriver>,
    sink: Arc<dyn StateSink>,
    last_kind: Mutex<Option<SessionKind>>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl ChangeMonitor {
    pub fn new(driver: Arc<dyn PageDriver>, sink: Arc<dyn StateSink>) -> Arc<Self> {
        Arc::new(Self {
            driver,
            sink,
            last_kind: Mutex::new(None),
            cancel: Mutex::new(None),
        })
    }

    /// Run the initial detection pass and subscribe to the mutation
    /// feed. Calling `start` again disconnects the previous
    /// subscription first, so no stale task keeps re-detecting.
    pub async fn start(self: &Arc<Self>) {
        let token = CancellationToken::new();
        {
            let mut cancel = self.cancel.lock();
            if let Some(previous) = cancel.take() {
                previous.cancel();
            }
            *cancel = Some(token.clone());
        }

        // Subscribe before the initial pass so no notice is lost in
        // between.
        let receiver = self.driver.mutations();
        self.pass().await;

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            monitor.run(receiver, token).await;
        });
    }

    /// Disconnect the mutation subscription.
    pub fn stop(&self) {
        if let Some(token) = self.cancel.lock().take() {
            token.cancel();
        }
    }

    /// Kind forwarded by the most recent transition.
    pub fn last_kind(&self) -> Option<SessionKind> {
        *self.last_kind.lock()
    }

    /// Re-detect immediately and return the current state, forwarding
    /// it if the kind changed. Used by pull-style state queries.
    pub async fn check_now(&self) -> SessionState {
        self.pass().await
    }

    async fn run(
        self: Arc<Self>,
        mut receiver: broadcast::Receiver<MutationNotice>,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("change monitor disconnected");
                    break;
                }
                notice = receiver.recv() => match notice {
                    Ok(_) => {
                        // Batches are coalesced upstream; one pass per
                        // notice.
                        self.pass().await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "mutation feed lagged; re-detecting once");
                        self.pass().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("mutation feed closed");
                        break;
                    }
                },
            }
        }
    }

    async fn pass(&self) -> SessionState {
        let facts = match PageFacts::collect(self.driver.as_ref()).await {
            Ok(facts) => facts,
            Err(err) => {
                // Keep the last state rather than flapping on a read
                // failure.
                warn!(error = %err, "page facts unavailable; keeping last state");
                let kind = (*self.last_kind.lock()).unwrap_or(SessionKind::NotTargetSite);
                return SessionState::for_kind(kind);
            }
        };

        let state = detect(&facts);
        let transitioned = {
            let mut last = self.last_kind.lock();
            if *last != Some(state.kind) {
                *last = Some(state.kind);
                true
            } else {
                false
            }
        };

        if transitioned {
            debug!(kind = ?state.kind, "session state transition");
            self.sink.on_transition(state).await;
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chessbridge_page_probe::{selectors, FakePage};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        transitions: Mutex<Vec<SessionKind>>,
    }

    #[async_trait]
    impl StateSink for RecordingSink {
        async fn on_transition(&self, state: SessionState) {
            self.transitions.lock().push(state.kind);
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn broadcasts_only_on_kind_change() {
        let page = Arc::new(FakePage::new("https://www.chess.com/game/live/1"));
        let sink = Arc::new(RecordingSink::default());
        let monitor = ChangeMonitor::new(page.clone(), sink.clone());

        monitor.start().await;
        assert_eq!(sink.transitions.lock().as_slice(), [SessionKind::NoSession]);

        // Same facts, three notices: no re-broadcast.
        for _ in 0..3 {
            page.emit_mutation();
        }
        settle().await;
        assert_eq!(sink.transitions.lock().len(), 1);

        // The game finishes.
        page.present(selectors::GAME_OVER_MODAL);
        page.emit_mutation();
        settle().await;
        assert_eq!(
            sink.transitions.lock().as_slice(),
            [SessionKind::NoSession, SessionKind::SessionComplete]
        );

        // Finished marker flaps in place: still no re-broadcast.
        page.emit_mutation();
        settle().await;
        assert_eq!(sink.transitions.lock().len(), 2);
        monitor.stop();
    }

    #[tokio::test]
    async fn regresses_when_a_new_game_starts() {
        let page = Arc::new(FakePage::new("https://www.chess.com/game/live/1"));
        page.present(selectors::GAME_OVER_MODAL);
        let sink = Arc::new(RecordingSink::default());
        let monitor = ChangeMonitor::new(page.clone(), sink.clone());

        monitor.start().await;
        assert_eq!(monitor.last_kind(), Some(SessionKind::SessionComplete));

        page.absent(selectors::GAME_OVER_MODAL);
        page.present(selectors::BOARD_CLOCK);
        page.emit_mutation();
        settle().await;
        assert_eq!(monitor.last_kind(), Some(SessionKind::SessionActive));
        monitor.stop();
    }

    #[tokio::test]
    async fn restart_does_not_leak_the_previous_subscription() {
        let page = Arc::new(FakePage::new("https://www.chess.com/game/live/1"));
        let sink = Arc::new(RecordingSink::default());
        let monitor = ChangeMonitor::new(page.clone(), sink.clone());

        monitor.start().await;
        monitor.start().await;
        settle().await;

        // One transition per kind change even with a restarted
        // subscription in between.
        page.present(selectors::GAME_OVER_MODAL);
        page.emit_mutation();
        settle().await;

        let transitions = sink.transitions.lock().clone();
        assert_eq!(
            transitions
                .iter()
                .filter(|kind| **kind == SessionKind::SessionComplete)
                .count(),
            1
        );
        monitor.stop();
    }

    #[tokio::test]
    async fn check_now_pulls_current_state() {
        let page = Arc::new(FakePage::new("https://example.com/"));
        let sink = Arc::new(RecordingSink::default());
        let monitor = ChangeMonitor::new(page.clone(), sink.clone());

        let state = monitor.check_now().await;
        assert_eq!(state.kind, SessionKind::NotTargetSite);
        assert_eq!(monitor.last_kind(), Some(SessionKind::NotTargetSite));
    }
}
