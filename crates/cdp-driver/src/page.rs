//! One live tab behind the page-driver seam.

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::{AddBindingParams, EventBindingCalled};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

use chessbridge_core_types::BridgeError;
use chessbridge_page_probe::{MutationNotice, PageDriver};

use crate::scripts;

/// Name of the page-world binding the mutation observer calls into.
pub(crate) const MUTATION_BINDING: &str = "__chessbridgeMutations";

pub(crate) fn cdp_err(err: CdpError) -> BridgeError {
    BridgeError::Network(format!("cdp i/o: {err}"))
}

fn parse_notice(payload: &str) -> MutationNotice {
    #[derive(serde::Deserialize)]
    struct Payload {
        #[serde(default)]
        #[serde(rename = "childList")]
        child_list: bool,
        #[serde(default)]
        #[serde(rename = "classAttr")]
        class_attr: bool,
    }

    match serde_json::from_str::<Payload>(payload) {
        Ok(parsed) => MutationNotice {
            child_list: parsed.child_list,
            class_attr: parsed.class_attr,
        },
        Err(_) => MutationNotice::any(),
    }
}

/// A driven tab. Mutation notices flow from the injected observer,
/// through the CDP binding, into a broadcast feed any number of
/// consumers can subscribe to.
pub struct CdpPage {
    page: Page,
    mutations: broadcast::Sender<MutationNotice>,
}

impl CdpPage {
    /// Wire a raw page: register the binding, install the observer on
    /// this and every future document, and start pumping binding
    /// calls into the feed.
    pub async fn attach(page: Page) -> Result<Arc<Self>, BridgeError> {
        page.execute(AddBindingParams::new(MUTATION_BINDING))
            .await
            .map_err(cdp_err)?;

        let observer = scripts::mutation_observer(MUTATION_BINDING);
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            observer.clone(),
        ))
        .await
        .map_err(cdp_err)?;

        let (sender, _) = broadcast::channel(64);
        let driven = Arc::new(Self {
            page,
            mutations: sender.clone(),
        });

        // The current document predates the on-new-document hook.
        driven.eval_value(&observer).await?;

        let mut events = driven
            .page
            .event_listener::<EventBindingCalled>()
            .await
            .map_err(cdp_err)?;
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.name != MUTATION_BINDING {
                    continue;
                }
                // No subscribers is fine; the feed is best-effort.
                let _ = sender.send(parse_notice(&event.payload));
            }
            debug!("mutation binding stream ended");
        });

        Ok(driven)
    }

    async fn eval_value(&self, script: &str) -> Result<Value, BridgeError> {
        let result = self.page.evaluate(script).await.map_err(cdp_err)?;
        Ok(result.into_value::<Value>().unwrap_or(Value::Null))
    }

    /// Run a script expecting `{ ok: bool, ... }`; a false `ok` means
    /// the selector matched nothing.
    async fn eval_element(&self, script: &str, selector: &str) -> Result<Value, BridgeError> {
        let value = self.eval_value(script).await?;
        let ok = value.get("ok").and_then(Value::as_bool).unwrap_or(false);
        if !ok {
            return Err(BridgeError::ElementNotFound(selector.to_string()));
        }
        Ok(value)
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn url(&self) -> Result<Url, BridgeError> {
        let raw = self
            .page
            .url()
            .await
            .map_err(cdp_err)?
            .ok_or_else(|| BridgeError::Unknown("page has no url".to_string()))?;
        Url::parse(&raw).map_err(|err| BridgeError::Unknown(format!("page url: {err}")))
    }

    async fn exists(&self, selector: &str) -> Result<bool, BridgeError> {
        let value = self.eval_value(&scripts::exists(selector)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, selector: &str) -> Result<(), BridgeError> {
        self.eval_element(&scripts::click(selector), selector)
            .await?;
        Ok(())
    }

    async fn read_value(&self, selector: &str) -> Result<String, BridgeError> {
        let value = self
            .eval_element(&scripts::read_value(selector), selector)
            .await?;
        Ok(value
            .get("value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn set_value(&self, selector: &str, value: &str) -> Result<(), BridgeError> {
        self.eval_element(&scripts::set_value(selector, value), selector)
            .await?;
        Ok(())
    }

    async fn dispatch_paste(&self, selector: &str) -> Result<(), BridgeError> {
        self.eval_element(&scripts::dispatch_paste(selector), selector)
            .await?;
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<String, BridgeError> {
        let value = self
            .eval_element(&scripts::inner_text(selector), selector)
            .await?;
        Ok(value
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn click_button_with_text(
        &self,
        text: &str,
        exact: bool,
    ) -> Result<bool, BridgeError> {
        let value = self
            .eval_value(&scripts::click_button_with_text(text, exact))
            .await?;
        Ok(value
            .get("clicked")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn click_submit_within(&self, anchor_selector: &str) -> Result<bool, BridgeError> {
        let value = self
            .eval_value(&scripts::click_submit_within(anchor_selector))
            .await?;
        Ok(value
            .get("clicked")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn eval(&self, script: &str) -> Result<Value, BridgeError> {
        self.eval_value(script).await
    }

    async fn navigate(&self, url: &str) -> Result<(), BridgeError> {
        self.page.goto(url).await.map_err(cdp_err)?;
        if let Err(err) = self.page.wait_for_navigation().await {
            warn!(error = %err, "navigation wait failed");
        }
        Ok(())
    }

    fn mutations(&self) -> broadcast::Receiver<MutationNotice> {
        self.mutations.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_parsing_defaults_to_everything() {
        let notice = parse_notice("{\"childList\":true,\"classAttr\":false}");
        assert!(notice.child_list);
        assert!(!notice.class_attr);

        let garbled = parse_notice("not json");
        assert!(garbled.child_list);
        assert!(garbled.class_attr);
    }
}
