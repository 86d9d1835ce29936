//! The retrieval → import → navigate flow.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use chessbridge_core_types::BridgeError;
use chessbridge_page_probe::PageDriver;
use chessbridge_record_fetch::{GamesProvider, ImportTarget, RetrievalPipeline};

/// Opens a URL in a fresh tab. Implemented by the browser bootstrap
/// in production and by a recorder in tests.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn open_tab(&self, url: &str) -> Result<(), BridgeError>;
}

/// One-shot flow: retrieve the finished game's movetext from the
/// source page, push it through the import endpoint, open the
/// resulting analysis URL.
pub struct AnalysisOpener {
    driver: Arc<dyn PageDriver>,
    provider: Arc<dyn GamesProvider>,
    importer: Arc<dyn ImportTarget>,
    navigator: Arc<dyn Navigator>,
}

impl AnalysisOpener {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        provider: Arc<dyn GamesProvider>,
        importer: Arc<dyn ImportTarget>,
        navigator: Arc<dyn Navigator>,
    ) -> Arc<Self> {
        Arc::new(Self {
            driver,
            provider,
            importer,
            navigator,
        })
    }

    /// Run the flow, returning the imported game's analysis URL.
    ///
    /// The navigation step is best-effort: once the import endpoint
    /// accepted the record, the URL is the durable result and a tab
    /// that failed to open only costs the user a click.
    pub async fn run(&self) -> Result<String, BridgeError> {
        let pipeline =
            RetrievalPipeline::for_source_page(self.driver.clone(), self.provider.clone());
        let movetext = pipeline.run().await.into_result()?;

        let url = self.importer.import(&movetext).await?;
        info!(%url, "record imported");

        if let Err(err) = self.navigator.open_tab(&url).await {
            warn!(error = %err, "imported but could not open the analysis tab");
        }
        Ok(url)
    }
}
