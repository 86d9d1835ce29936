//! Element-appearance waiting.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use chessbridge_core_types::BridgeError;
use chessbridge_page_probe::PageDriver;

/// Wait until `selector` matches a node, bounded by `timeout`.
///
/// Implemented as a mutation-feed subscription raced against the
/// timeout and the caller's cancellation token; the document is only
/// re-probed when it actually changed. The subscription is taken
/// before the first probe so an appearance between probe and
/// subscribe cannot be missed.
pub async fn wait_for_element(
    driver: &dyn PageDriver,
    selector: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<(), BridgeError> {
    let mut notices = driver.mutations();

    if driver.exists(selector).await? {
        return Ok(());
    }

    let watch = async {
        loop {
            match notices.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if driver.exists(selector).await? {
                        return Ok(());
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(BridgeError::ElementNotFound(format!(
                        "{selector}: mutation feed closed before it appeared"
                    )));
                }
            }
        }
    };

    tokio::select! {
        outcome = tokio::time::timeout(timeout, watch) => match outcome {
            Ok(result) => result,
            Err(_) => {
                debug!(selector, ?timeout, "element did not appear in time");
                Err(BridgeError::Timeout(format!(
                    "{selector} did not appear within {}ms",
                    timeout.as_millis()
                )))
            }
        },
        _ = cancel.cancelled() => Err(BridgeError::Unknown(format!(
            "wait for {selector} cancelled"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chessbridge_page_probe::FakePage;
    use std::sync::Arc;

    #[tokio::test]
    async fn returns_immediately_when_already_present() {
        let page = FakePage::new("https://lichess.org/analysis");
        page.present(".pgn-input");

        let cancel = CancellationToken::new();
        wait_for_element(&page, ".pgn-input", Duration::from_millis(100), &cancel)
            .await
            .expect("present");
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_when_the_element_appears() {
        let page = Arc::new(FakePage::new("https://lichess.org/analysis"));
        let appearing = page.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            appearing.present(".pgn-input");
            appearing.emit_mutation();
        });

        let cancel = CancellationToken::new();
        wait_for_element(
            page.as_ref(),
            ".pgn-input",
            Duration::from_secs(2),
            &cancel,
        )
        .await
        .expect("appears");
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_a_distinguishable_failure() {
        let page = FakePage::new("https://lichess.org/analysis");

        let cancel = CancellationToken::new();
        let err = wait_for_element(&page, ".pgn-input", Duration::from_millis(200), &cancel)
            .await
            .expect_err("timeout");
        assert!(matches!(err, BridgeError::Timeout(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn cancellation_aborts_the_wait() {
        let page = FakePage::new("https://lichess.org/analysis");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = wait_for_element(&page, ".pgn-input", Duration::from_secs(5), &cancel)
            .await
            .expect_err("cancelled");
        assert!(matches!(err, BridgeError::Unknown(_)));
    }
}
