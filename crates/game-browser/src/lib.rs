//! Historical game browser.
//!
//! Lets the user pick one of their recent games and feeds the
//! selection into the injection pipeline, guarded so rapid repeated
//! picks cannot start two injections.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use tracing::{debug, info, warn};

use chessbridge_core_types::{BridgeError, GameRecord, PendingInjection};
use chessbridge_page_probe::PageDriver;
use chessbridge_record_fetch::GamesProvider;
use chessbridge_record_inject::{show_banner, BannerKind, InjectionOutcome, InjectionPipeline};

/// Remembered source-site identity, persisted across runs.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn remembered_username(&self) -> Option<String>;

    /// Fire-and-forget persist; a failing store only costs the user a
    /// future prompt.
    async fn remember_username(&self, username: &str);
}

/// How one selection ended.
#[derive(Debug)]
pub enum SelectDisposition {
    Completed(InjectionOutcome),
    Failed(BridgeError),
    /// Another injection was already in flight; this pick was a no-op.
    AlreadyInFlight,
}

/// Fetches, filters and injects historical records.
pub struct GameBrowser {
    provider: Arc<dyn GamesProvider>,
    store: Arc<dyn IdentityStore>,
    pending: PendingInjection,
}

impl GameBrowser {
    pub fn new(provider: Arc<dyn GamesProvider>, store: Arc<dyn IdentityStore>) -> Self {
        Self {
            provider,
            store,
            pending: PendingInjection::new(),
        }
    }

    /// The identity to list games for, if one was remembered.
    pub async fn resolve_identity(&self) -> Option<String> {
        self.store.remembered_username().await
    }

    /// Persist the identity entered at the prompt.
    pub async fn submit_identity(&self, username: &str) {
        self.store.remember_username(username).await;
    }

    /// One month of records for `username`, most recent first.
    pub async fn load_games(&self, username: &str) -> Result<Vec<GameRecord>, BridgeError> {
        let now = Utc::now();
        let mut games = self
            .provider
            .month_games(username, now.year(), now.month())
            .await?;
        if games.is_empty() {
            return Err(BridgeError::NotFound(format!(
                "no games found for '{username}'"
            )));
        }
        games.sort_by(|a, b| b.end_time.cmp(&a.end_time));
        Ok(games)
    }

    /// Inject the picked record, guarded by the pending flag. A pick
    /// while an injection is in flight is dropped, not queued.
    pub async fn select(
        &self,
        record: &GameRecord,
        pipeline: &InjectionPipeline,
        driver: &dyn PageDriver,
    ) -> SelectDisposition {
        let Some(_permit) = self.pending.begin() else {
            debug!(game = %record.id, "injection already in flight; ignoring pick");
            return SelectDisposition::AlreadyInFlight;
        };

        info!(game = %record.id, pairing = %record.pairing(), "loading picked game");
        match pipeline.load(&record.movetext).await {
            Ok(outcome) => {
                show_banner(driver, BannerKind::Success, "Game loaded into the analysis board")
                    .await;
                SelectDisposition::Completed(outcome)
            }
            Err(err) => {
                warn!(error = %err, "injection failed");
                show_banner(driver, BannerKind::Error, "Could not load the game").await;
                SelectDisposition::Failed(err)
            }
        }
    }
}

/// Case-insensitive substring filter across both usernames and the
/// result notation. Cheap enough to recompute per keystroke at this
/// data volume.
pub fn filter_games<'a>(games: &'a [GameRecord], query: &str) -> Vec<&'a GameRecord> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return games.iter().collect();
    }
    games
        .iter()
        .filter(|game| {
            game.white.username.to_lowercase().contains(&query)
                || game.black.username.to_lowercase().contains(&query)
                || game.result.to_string().contains(&query)
        })
        .collect()
}
