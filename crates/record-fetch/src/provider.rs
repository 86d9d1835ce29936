//! Provider endpoint client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use chessbridge_core_types::{BridgeError, GameRecord};

use crate::model::{records_from_response, GamesResponse};

/// Bound on every provider request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_BASE_URL: &str = "https://api.chess.com/pub";

/// Source of historical game records, one month at a time.
#[async_trait]
pub trait GamesProvider: Send + Sync {
    async fn month_games(
        &self,
        username: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<GameRecord>, BridgeError>;
}

/// Client for the provider's public monthly-games endpoint.
pub struct HttpGamesProvider {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGamesProvider {
    pub fn new() -> Result<Self, BridgeError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| BridgeError::Unknown(format!("http client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn month_url(&self, username: &str, year: i32, month: u32) -> String {
        format!(
            "{}/player/{}/games/{}/{:02}",
            self.base_url, username, year, month
        )
    }
}

/// Map a transport failure onto the taxonomy.
pub(crate) fn transport_error(err: reqwest::Error, context: &str) -> BridgeError {
    if err.is_timeout() {
        BridgeError::Timeout(format!("{context}: {err}"))
    } else {
        BridgeError::Network(format!("{context}: {err}"))
    }
}

/// Map a non-success status onto the taxonomy.
pub(crate) fn status_error(status: reqwest::StatusCode, context: &str) -> BridgeError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        BridgeError::RateLimited(format!("{context}: {status}"))
    } else if status == reqwest::StatusCode::NOT_FOUND {
        BridgeError::NotFound(format!("{context}: {status}"))
    } else if status.is_server_error() {
        BridgeError::Network(format!("{context}: {status}"))
    } else {
        BridgeError::Unknown(format!("{context}: {status}"))
    }
}

#[async_trait]
impl GamesProvider for HttpGamesProvider {
    async fn month_games(
        &self,
        username: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<GameRecord>, BridgeError> {
        let url = self.month_url(username, year, month);
        debug!(%url, "fetching monthly games");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| transport_error(err, "monthly games request"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "monthly games request"));
        }

        let payload: GamesResponse = response
            .json()
            .await
            .map_err(|err| BridgeError::Unknown(format!("monthly games payload: {err}")))?;

        Ok(records_from_response(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_url_pads_the_month() {
        let provider = HttpGamesProvider::with_base_url("https://api.example/pub/").expect("client");
        assert_eq!(
            provider.month_url("anna", 2026, 8),
            "https://api.example/pub/player/anna/games/2026/08"
        );
    }

    #[test]
    fn status_mapping_follows_the_taxonomy() {
        assert!(matches!(
            status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "x"),
            BridgeError::RateLimited(_)
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::NOT_FOUND, "x"),
            BridgeError::NotFound(_)
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::BAD_GATEWAY, "x"),
            BridgeError::Network(_)
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::FORBIDDEN, "x"),
            BridgeError::Unknown(_)
        ));
    }
}
