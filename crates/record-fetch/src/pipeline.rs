//! Ordered strategy chain.

use std::sync::Arc;

use tracing::{debug, info, warn};

use chessbridge_core_types::{BridgeError, RetrievalOutcome};
use chessbridge_page_probe::PageDriver;

use crate::provider::GamesProvider;
use crate::strategies::{ApiStrategy, RetrievalStrategy, ShareDialogStrategy};

/// Runs the strategies top to bottom until one succeeds.
///
/// Strategies are never interleaved: the share-dialog fallback opens
/// a visible modal and must not run when the endpoint already
/// delivered. When every strategy fails, the combined failure lists
/// each strategy's reason — the true cause may be in either.
pub struct RetrievalPipeline {
    strategies: Vec<Arc<dyn RetrievalStrategy>>,
}

impl RetrievalPipeline {
    pub fn new(strategies: Vec<Arc<dyn RetrievalStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard chain for a finished game on the source page.
    pub fn for_source_page(
        driver: Arc<dyn PageDriver>,
        provider: Arc<dyn GamesProvider>,
    ) -> Self {
        Self::new(vec![
            Arc::new(ApiStrategy::new(driver.clone(), provider)),
            Arc::new(ShareDialogStrategy::new(driver)),
        ])
    }

    pub async fn run(&self) -> RetrievalOutcome {
        let mut failures: Vec<(&'static str, BridgeError)> = Vec::new();

        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "attempting retrieval");
            match strategy.attempt().await {
                RetrievalOutcome::Success(movetext) => {
                    info!(strategy = strategy.name(), "retrieval succeeded");
                    return RetrievalOutcome::Success(movetext);
                }
                RetrievalOutcome::Failure(err) => {
                    warn!(strategy = strategy.name(), error = %err, "retrieval strategy failed");
                    failures.push((strategy.name(), err));
                }
            }
        }

        RetrievalOutcome::Failure(combine_failures(&failures))
    }
}

/// Fold every strategy's reason into one user-facing failure.
fn combine_failures(failures: &[(&'static str, BridgeError)]) -> BridgeError {
    if failures.is_empty() {
        return BridgeError::Unknown("no retrieval strategies configured".to_string());
    }
    let summary = failures
        .iter()
        .map(|(name, err)| format!("{name}: {err}"))
        .collect::<Vec<_>>()
        .join("; ");
    BridgeError::Unknown(format!("all retrieval strategies failed: {summary}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct ScriptedStrategy {
        name: &'static str,
        outcome: RetrievalOutcome,
        invocations: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl RetrievalStrategy for ScriptedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn attempt(&self) -> RetrievalOutcome {
            *self.invocations.lock() += 1;
            self.outcome.clone()
        }
    }

    fn strategy(
        name: &'static str,
        outcome: RetrievalOutcome,
    ) -> (Arc<ScriptedStrategy>, Arc<Mutex<u32>>) {
        let invocations = Arc::new(Mutex::new(0));
        (
            Arc::new(ScriptedStrategy {
                name,
                outcome,
                invocations: invocations.clone(),
            }),
            invocations,
        )
    }

    #[tokio::test]
    async fn first_success_stops_the_chain() {
        let (first, _) = strategy("api", RetrievalOutcome::Success("1. e4 e5".to_string()));
        let (second, second_count) = strategy(
            "share-dialog",
            RetrievalOutcome::Success("unused".to_string()),
        );

        let outcome = RetrievalPipeline::new(vec![first, second]).run().await;
        assert!(matches!(outcome, RetrievalOutcome::Success(m) if m == "1. e4 e5"));
        assert_eq!(*second_count.lock(), 0);
    }

    #[tokio::test]
    async fn deterministic_not_found_falls_through_exactly_once() {
        let (first, first_count) = strategy(
            "api",
            RetrievalOutcome::Failure(BridgeError::NotFound("no games".to_string())),
        );
        let (second, second_count) = strategy(
            "share-dialog",
            RetrievalOutcome::Success("1. c4".to_string()),
        );

        let outcome = RetrievalPipeline::new(vec![first, second]).run().await;
        assert!(matches!(outcome, RetrievalOutcome::Success(m) if m == "1. c4"));
        assert_eq!(*first_count.lock(), 1);
        assert_eq!(*second_count.lock(), 1);
    }

    #[tokio::test]
    async fn combined_failure_carries_both_reasons() {
        let (first, _) = strategy(
            "api",
            RetrievalOutcome::Failure(BridgeError::NotFound("no games".to_string())),
        );
        let (second, _) = strategy(
            "share-dialog",
            RetrievalOutcome::Failure(BridgeError::ElementNotFound("share control".to_string())),
        );

        let outcome = RetrievalPipeline::new(vec![first, second]).run().await;
        match outcome {
            RetrievalOutcome::Failure(err) => {
                let message = err.to_string();
                assert!(message.contains("api: not found: no games"));
                assert!(message.contains("share-dialog: element not found: share control"));
            }
            RetrievalOutcome::Success(_) => panic!("expected combined failure"),
        }
    }
}
