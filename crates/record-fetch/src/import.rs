//! Target-site import endpoint client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use chessbridge_core_types::BridgeError;

use crate::provider::{status_error, transport_error, REQUEST_TIMEOUT};

const DEFAULT_IMPORT_URL: &str = "https://lichess.org/api/import";

/// Pushes a movetext to the target site, returning the URL of the
/// imported game.
#[async_trait]
pub trait ImportTarget: Send + Sync {
    async fn import(&self, movetext: &str) -> Result<String, BridgeError>;
}

#[derive(Debug, Deserialize)]
struct ImportResponse {
    url: String,
}

/// Client for the target site's import endpoint.
pub struct HttpImportClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpImportClient {
    pub fn new() -> Result<Self, BridgeError> {
        Self::with_endpoint(DEFAULT_IMPORT_URL)
    }

    pub fn with_endpoint(endpoint: &str) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| BridgeError::Unknown(format!("http client: {err}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl ImportTarget for HttpImportClient {
    async fn import(&self, movetext: &str) -> Result<String, BridgeError> {
        debug!(endpoint = %self.endpoint, "importing record");

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("pgn", movetext)])
            .send()
            .await
            .map_err(|err| transport_error(err, "import request"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "import request"));
        }

        let payload: ImportResponse = response
            .json()
            .await
            .map_err(|err| BridgeError::Unknown(format!("import payload: {err}")))?;
        Ok(payload.url)
    }
}
