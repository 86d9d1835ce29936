//! The two retrieval strategies.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use tokio::time::sleep;
use tracing::debug;

use chessbridge_core_types::{BridgeError, RetrievalOutcome};
use chessbridge_page_probe::{selectors, PageDriver};

use crate::identity;
use crate::provider::GamesProvider;
use crate::select::select_record;

/// One way of obtaining the finished game's movetext.
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self) -> RetrievalOutcome;
}

/// Strategy 1: the provider's public monthly-games endpoint.
///
/// No page side effects; fails with a reason whenever an identity
/// cannot be derived, the endpoint is unhappy, or the month holds no
/// usable record.
pub struct ApiStrategy {
    driver: Arc<dyn PageDriver>,
    provider: Arc<dyn GamesProvider>,
}

impl ApiStrategy {
    pub fn new(driver: Arc<dyn PageDriver>, provider: Arc<dyn GamesProvider>) -> Self {
        Self { driver, provider }
    }

    async fn run(&self) -> Result<String, BridgeError> {
        let url = self.driver.url().await?;

        let game_id = identity::game_id_from_url(&url);
        let username = match identity::username_from_url(&url) {
            Some(username) => username,
            None => identity::username_from_page(self.driver.as_ref())
                .await?
                .ok_or_else(|| {
                    BridgeError::NotFound("no player identity on page or in url".to_string())
                })?,
        };

        let now = Utc::now();
        debug!(%username, game_id = ?game_id, "querying provider for current month");
        let games = self
            .provider
            .month_games(&username, now.year(), now.month())
            .await?;

        if games.is_empty() {
            return Err(BridgeError::NotFound(format!(
                "no games for '{username}' this month"
            )));
        }

        let record = select_record(&games, game_id.as_deref()).ok_or_else(|| {
            BridgeError::NotFound(format!("no record with movetext for '{username}'"))
        })?;
        Ok(record.movetext.clone())
    }
}

#[async_trait]
impl RetrievalStrategy for ApiStrategy {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn attempt(&self) -> RetrievalOutcome {
        match self.run().await {
            Ok(movetext) => RetrievalOutcome::Success(movetext),
            Err(err) => RetrievalOutcome::Failure(err),
        }
    }
}

/// Attach the control's role to a missing-element failure so the two
/// dialog lookups stay distinguishable in logs.
fn labelled(err: BridgeError, label: &str) -> BridgeError {
    match err {
        BridgeError::ElementNotFound(selector) => {
            BridgeError::ElementNotFound(format!("{label} ({selector})"))
        }
        other => other,
    }
}

/// Strategy 2: drive the share dialog.
///
/// Opens a visible modal, so it must only run once strategy 1 has
/// failed. Each lookup raises immediately with an element-specific
/// reason; nothing here is retried.
pub struct ShareDialogStrategy {
    driver: Arc<dyn PageDriver>,

    /// Settle after opening the dialog (milliseconds).
    pub dialog_settle: Duration,

    /// Settle after switching to the PGN tab (milliseconds).
    pub tab_settle: Duration,
}

impl ShareDialogStrategy {
    pub fn new(driver: Arc<dyn PageDriver>) -> Self {
        Self {
            driver,
            dialog_settle: Duration::from_millis(1500),
            tab_settle: Duration::from_millis(500),
        }
    }

    async fn run(&self) -> Result<String, BridgeError> {
        self.driver
            .click(selectors::SHARE_CONTROL)
            .await
            .map_err(|err| labelled(err, "share control"))?;
        sleep(self.dialog_settle).await;

        self.driver
            .click(selectors::SHARE_PGN_TAB)
            .await
            .map_err(|err| labelled(err, "share dialog pgn tab"))?;
        sleep(self.tab_settle).await;

        let movetext = self
            .driver
            .read_value(selectors::SHARE_PGN_TEXTAREA)
            .await
            .map_err(|err| labelled(err, "share dialog pgn textarea"))?;

        // Leave the page as we found it; a missing close control is
        // not worth failing over once the movetext is in hand.
        if self
            .driver
            .exists(selectors::SHARE_CLOSE)
            .await
            .unwrap_or(false)
        {
            let _ = self.driver.click(selectors::SHARE_CLOSE).await;
        }

        if movetext.trim().is_empty() {
            return Err(BridgeError::NotFound(
                "share dialog textarea was empty".to_string(),
            ));
        }
        Ok(movetext)
    }
}

#[async_trait]
impl RetrievalStrategy for ShareDialogStrategy {
    fn name(&self) -> &'static str {
        "share-dialog"
    }

    async fn attempt(&self) -> RetrievalOutcome {
        match self.run().await {
            Ok(movetext) => RetrievalOutcome::Success(movetext),
            Err(err) => RetrievalOutcome::Failure(err),
        }
    }
}
