//! Browser bootstrap.

use std::sync::Arc;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use chessbridge_core_types::BridgeError;

use crate::config::{discover_browser, DriverConfig};
use crate::page::{cdp_err, CdpPage};

/// A launched Chromium instance plus its event pump.
///
/// Held behind an `Arc` by everything that opens tabs; closing is
/// therefore `&self`.
pub struct CdpBrowser {
    browser: Mutex<Browser>,
    handler_task: JoinHandle<()>,
}

impl CdpBrowser {
    /// Launch a browser according to `config`, discovering the binary
    /// on the PATH when none was given.
    pub async fn launch(config: &DriverConfig) -> Result<Arc<Self>, BridgeError> {
        let mut builder = BrowserConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some((width, height)) = config.window {
            builder = builder.window_size(width, height);
        }
        if let Some(executable) = config.executable.clone().or_else(discover_browser) {
            info!(executable = %executable.display(), "using browser binary");
            builder = builder.chrome_executable(executable);
        }

        let browser_config = builder
            .build()
            .map_err(|err| BridgeError::Unknown(format!("browser config: {err}")))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(cdp_err)?;

        // The handler stream must be pumped for the connection to make
        // progress.
        let handler_task = tokio::spawn(async move {
            while let Some(item) = handler.next().await {
                if let Err(err) = item {
                    debug!(error = %err, "cdp handler event error");
                }
            }
            debug!("cdp handler stream ended");
        });

        Ok(Arc::new(Self {
            browser: Mutex::new(browser),
            handler_task,
        }))
    }

    /// Open a new tab at `url` and wire it as a driven page.
    pub async fn open(&self, url: &str) -> Result<Arc<CdpPage>, BridgeError> {
        let page = {
            let browser = self.browser.lock().await;
            browser.new_page(url).await.map_err(cdp_err)?
        };
        CdpPage::attach(page).await
    }

    /// Close the browser and stop the event pump.
    pub async fn close(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(err) = browser.close().await {
            debug!(error = %err, "browser close failed");
        }
        self.handler_task.abort();
    }
}
