//! Settings service over the key-value store.
//!
//! Individual keys mirror the stored shape of the original settings
//! surface; a missing key always falls back to the default, and every
//! save is announced over the bus so other contexts pick the change
//! up without polling.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use chessbridge_core_types::{Settings, ThemeOption};
use chessbridge_game_browser::IdentityStore;
use chessbridge_message_bus::{Message, MessageBus};
use chessbridge_state_watch::SettingsSource;

use crate::storage::Storage;

const KEY_LANGUAGE: &str = "language";
const KEY_THEME: &str = "theme";
const KEY_NOTIFICATIONS: &str = "notifications";
const KEY_AUTO_OPEN: &str = "autoOpenLichess";
const KEY_USERNAME: &str = "chesscomUsername";
const KEY_HAS_SEEN_WELCOME: &str = "hasSeenWelcome";

/// Load/save settings and announce changes.
pub struct SettingsService {
    storage: Arc<Storage>,
    bus: Arc<MessageBus>,
}

impl SettingsService {
    pub fn new(storage: Arc<Storage>, bus: Arc<MessageBus>) -> Arc<Self> {
        Arc::new(Self { storage, bus })
    }

    pub async fn load(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            language: self
                .string(KEY_LANGUAGE)
                .await
                .unwrap_or(defaults.language),
            theme: self.theme(KEY_THEME).await.unwrap_or(defaults.theme),
            notifications: self
                .bool(KEY_NOTIFICATIONS)
                .await
                .unwrap_or(defaults.notifications),
            auto_open_analysis: self
                .bool(KEY_AUTO_OPEN)
                .await
                .unwrap_or(defaults.auto_open_analysis),
            source_username: self.string(KEY_USERNAME).await,
            has_seen_welcome: self
                .bool(KEY_HAS_SEEN_WELCOME)
                .await
                .unwrap_or(defaults.has_seen_welcome),
        }
    }

    /// Persist every field and announce the change. The announcement
    /// is best-effort; contexts that are not running simply miss it.
    pub async fn save(&self, settings: &Settings) {
        self.storage
            .set(KEY_LANGUAGE, json!(settings.language))
            .await;
        self.storage.set(KEY_THEME, json!(settings.theme)).await;
        self.storage
            .set(KEY_NOTIFICATIONS, json!(settings.notifications))
            .await;
        self.storage
            .set(KEY_AUTO_OPEN, json!(settings.auto_open_analysis))
            .await;
        match &settings.source_username {
            Some(username) => self.storage.set(KEY_USERNAME, json!(username)).await,
            None => self.storage.remove(KEY_USERNAME).await,
        }
        self.storage
            .set(KEY_HAS_SEEN_WELCOME, json!(settings.has_seen_welcome))
            .await;

        self.bus.publish(Message::SettingsChanged {
            settings: settings.clone(),
        });
    }

    async fn string(&self, key: &str) -> Option<String> {
        match self.storage.get(key).await {
            Some(Value::String(value)) => Some(value),
            _ => None,
        }
    }

    async fn bool(&self, key: &str) -> Option<bool> {
        self.storage.get(key).await.and_then(|v| v.as_bool())
    }

    async fn theme(&self, key: &str) -> Option<ThemeOption> {
        let value = self.storage.get(key).await?;
        serde_json::from_value(value).ok()
    }
}

#[async_trait]
impl SettingsSource for SettingsService {
    async fn current(&self) -> Settings {
        self.load().await
    }
}

#[async_trait]
impl IdentityStore for SettingsService {
    async fn remembered_username(&self) -> Option<String> {
        self.string(KEY_USERNAME).await
    }

    async fn remember_username(&self, username: &str) {
        debug!(username, "remembering source-site identity");
        self.storage.set(KEY_USERNAME, json!(username)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (Arc<SettingsService>, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Arc::new(Storage::open(dir.path().join("storage.json")));
        let bus = MessageBus::new(8);
        (SettingsService::new(storage, bus), dir)
    }

    #[tokio::test]
    async fn empty_store_yields_defaults() {
        let (service, _dir) = service();
        assert_eq!(service.load().await, Settings::default());
    }

    #[tokio::test]
    async fn save_round_trips_every_field() {
        let (service, _dir) = service();
        let settings = Settings {
            language: "pt".to_string(),
            theme: ThemeOption::Dark,
            notifications: false,
            auto_open_analysis: true,
            source_username: Some("anna".to_string()),
            has_seen_welcome: true,
        };

        service.save(&settings).await;
        assert_eq!(service.load().await, settings);
    }

    #[tokio::test]
    async fn identity_store_round_trips() {
        let (service, _dir) = service();
        assert!(service.remembered_username().await.is_none());
        service.remember_username("anna").await;
        assert_eq!(service.remembered_username().await.as_deref(), Some("anna"));
    }
}
