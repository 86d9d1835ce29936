//! The injection pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use chessbridge_core_types::BridgeError;
use chessbridge_page_probe::{probes, selectors, PageDriver};

use crate::wait::wait_for_element;

/// How an injection ended. Both variants are successes: once the
/// movetext is visibly in the control, the user can always press the
/// import button themselves.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InjectionOutcome {
    /// Value set and the import control clicked.
    Submitted,
    /// Value set, but no import control could be found.
    FilledOnly,
}

/// Drives the target analysis board's PGN import controls.
pub struct InjectionPipeline {
    driver: Arc<dyn PageDriver>,
    cancel: CancellationToken,

    /// Settle after clearing a non-empty control; the host page's
    /// debounced validation rejects a rapid clear+set.
    pub clear_settle: Duration,

    /// Settle after filling, before looking for the import control.
    pub input_settle: Duration,

    /// Bound on waiting for the input control to appear after the
    /// open-import trigger was clicked.
    pub appear_timeout: Duration,
}

impl InjectionPipeline {
    pub fn new(driver: Arc<dyn PageDriver>) -> Self {
        Self {
            driver,
            cancel: CancellationToken::new(),
            clear_settle: Duration::from_millis(50),
            input_settle: Duration::from_millis(100),
            appear_timeout: Duration::from_secs(2),
        }
    }

    /// Token aborting any in-flight appearance wait.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Load `movetext` into the board.
    ///
    /// Hard failures are a wrong page and an input control that never
    /// appears; a missing import control is not one.
    pub async fn load(&self, movetext: &str) -> Result<InjectionOutcome, BridgeError> {
        let url = self.driver.url().await?;
        if !probes::is_target_analysis_page(&url) {
            return Err(BridgeError::Unknown(format!(
                "not on the analysis board: {url}"
            )));
        }

        if self.driver.exists(selectors::PGN_INPUT).await? {
            return self.fill_and_submit(movetext).await;
        }

        // The import pane is closed; open it and wait for the control.
        self.click_open_trigger().await?;
        wait_for_element(
            self.driver.as_ref(),
            selectors::PGN_INPUT,
            self.appear_timeout,
            &self.cancel,
        )
        .await?;
        self.fill_and_submit(movetext).await
    }

    async fn click_open_trigger(&self) -> Result<(), BridgeError> {
        for trigger in selectors::OPEN_IMPORT_TRIGGERS {
            if self.driver.exists(trigger).await? {
                debug!(trigger, "opening the import pane");
                self.driver.click(trigger).await?;
                return Ok(());
            }
        }
        Err(BridgeError::ElementNotFound(
            "no import trigger and no pgn input control".to_string(),
        ))
    }

    async fn fill_and_submit(&self, movetext: &str) -> Result<InjectionOutcome, BridgeError> {
        let existing = self.driver.read_value(selectors::PGN_INPUT).await?;
        if !existing.trim().is_empty() {
            // Clear-then-set, never append; identical text goes
            // through the same sequence so re-runs stay idempotent.
            self.driver.set_value(selectors::PGN_INPUT, "").await?;
            sleep(self.clear_settle).await;
        }

        self.driver.set_value(selectors::PGN_INPUT, movetext).await?;
        self.driver.dispatch_paste(selectors::PGN_INPUT).await?;
        sleep(self.input_settle).await;

        if self
            .driver
            .click_button_with_text(selectors::IMPORT_BUTTON_TEXT, true)
            .await?
        {
            info!("record imported via the import button");
            return Ok(InjectionOutcome::Submitted);
        }

        if self
            .driver
            .click_submit_within(selectors::PGN_INPUT)
            .await?
        {
            info!("record imported via the wrapper submit control");
            return Ok(InjectionOutcome::Submitted);
        }

        debug!("movetext in place but no submit control found");
        Ok(InjectionOutcome::FilledOnly)
    }
}
