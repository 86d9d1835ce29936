//! Persistent key-value storage.
//!
//! A flat JSON file under the platform config dir. Reads treat a
//! missing file or key as "use default"; writes are fire-and-forget
//! from the caller's perspective and only logged on failure.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::warn;

/// File-backed key-value store.
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn open(path: PathBuf) -> Self {
        Self { path }
    }

    /// Platform default: `<config dir>/chessbridge/storage.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chessbridge")
            .join("storage.json")
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.read_map().await.remove(key)
    }

    pub async fn set(&self, key: &str, value: Value) {
        let mut map = self.read_map().await;
        map.insert(key.to_string(), value);
        self.write_map(map).await;
    }

    pub async fn remove(&self, key: &str) {
        let mut map = self.read_map().await;
        if map.remove(key).is_some() {
            self.write_map(map).await;
        }
    }

    async fn read_map(&self) -> Map<String, Value> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str::<Map<String, Value>>(&raw).unwrap_or_else(|err| {
                warn!(path = %self.path.display(), error = %err, "storage file unreadable; starting empty");
                Map::new()
            }),
            Err(_) => Map::new(),
        }
    }

    async fn write_map(&self, map: Map<String, Value>) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                warn!(path = %parent.display(), error = %err, "storage dir not creatable");
                return;
            }
        }
        match serde_json::to_string_pretty(&Value::Object(map)) {
            Ok(serialized) => {
                if let Err(err) = tokio::fs::write(&self.path, serialized).await {
                    warn!(path = %self.path.display(), error = %err, "storage write failed");
                }
            }
            Err(err) => warn!(error = %err, "storage serialization failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::open(dir.path().join("storage.json"));
        assert!(storage.get("language").await.is_none());
    }

    #[tokio::test]
    async fn values_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::open(dir.path().join("nested").join("storage.json"));

        storage.set("language", json!("en")).await;
        storage.set("autoOpenLichess", json!(true)).await;

        assert_eq!(storage.get("language").await, Some(json!("en")));
        assert_eq!(storage.get("autoOpenLichess").await, Some(json!(true)));

        storage.remove("language").await;
        assert!(storage.get("language").await.is_none());
    }
}
