//! Scriptable in-memory page for tests.
//!
//! Mirrors the production driver closely enough that every pipeline
//! can run against it: selectors are present or absent, form controls
//! hold values, clicks and dispatched events are recorded, and
//! mutation notices are emitted by hand.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use url::Url;

use chessbridge_core_types::BridgeError;

use crate::driver::{MutationNotice, PageDriver};

#[derive(Default)]
struct Inner {
    url: Option<Url>,
    present: HashSet<String>,
    values: HashMap<String, String>,
    texts: HashMap<String, String>,
    buttons: Vec<String>,
    container_submit: bool,
    reveal_on_click: HashMap<String, String>,
    clicks: Vec<String>,
    value_history: HashMap<String, Vec<String>>,
    events: HashMap<String, Vec<String>>,
    eval_scripts: Vec<String>,
    eval_results: VecDeque<serde_json::Value>,
    navigations: Vec<String>,
}

/// In-memory stand-in for a live document.
pub struct FakePage {
    inner: Mutex<Inner>,
    mutations: broadcast::Sender<MutationNotice>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        let (mutations, _) = broadcast::channel(64);
        let page = Self {
            inner: Mutex::new(Inner::default()),
            mutations,
        };
        page.set_url(url);
        page
    }

    pub fn set_url(&self, url: &str) {
        self.inner.lock().url = Url::parse(url).ok();
    }

    /// Mark a selector as matching at least one node.
    pub fn present(&self, selector: &str) {
        self.inner.lock().present.insert(selector.to_string());
    }

    pub fn absent(&self, selector: &str) {
        let mut inner = self.inner.lock();
        inner.present.remove(selector);
        inner.values.remove(selector);
    }

    /// Seed a form control with a value (implies presence).
    pub fn seed_value(&self, selector: &str, value: &str) {
        let mut inner = self.inner.lock();
        inner.present.insert(selector.to_string());
        inner.values.insert(selector.to_string(), value.to_string());
    }

    /// Seed a node's visible text (implies presence).
    pub fn seed_text(&self, selector: &str, text: &str) {
        let mut inner = self.inner.lock();
        inner.present.insert(selector.to_string());
        inner.texts.insert(selector.to_string(), text.to_string());
    }

    /// Add a button discoverable by its visible text.
    pub fn add_button(&self, label: &str) {
        self.inner.lock().buttons.push(label.to_string());
    }

    /// Make the import wrapper around the input control expose a
    /// generic submit button.
    pub fn enable_container_submit(&self) {
        self.inner.lock().container_submit = true;
    }

    /// Script a click side effect: clicking `trigger` makes
    /// `revealed` appear.
    pub fn reveal_on_click(&self, trigger: &str, revealed: &str) {
        self.inner
            .lock()
            .reveal_on_click
            .insert(trigger.to_string(), revealed.to_string());
    }

    /// Queue the value the next `eval` call returns.
    pub fn push_eval_result(&self, value: serde_json::Value) {
        self.inner.lock().eval_results.push_back(value);
    }

    /// Emit one coalesced mutation notice to all subscribers.
    pub fn emit_mutation(&self) {
        let _ = self.mutations.send(MutationNotice::any());
    }

    // Recorded interactions, for assertions.

    pub fn clicks(&self) -> Vec<String> {
        self.inner.lock().clicks.clone()
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.inner.lock().values.get(selector).cloned()
    }

    /// Every value the control went through, oldest first.
    pub fn value_history(&self, selector: &str) -> Vec<String> {
        self.inner
            .lock()
            .value_history
            .get(selector)
            .cloned()
            .unwrap_or_default()
    }

    pub fn events_for(&self, selector: &str) -> Vec<String> {
        self.inner
            .lock()
            .events
            .get(selector)
            .cloned()
            .unwrap_or_default()
    }

    pub fn eval_scripts(&self) -> Vec<String> {
        self.inner.lock().eval_scripts.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.inner.lock().navigations.clone()
    }
}

fn missing(selector: &str) -> BridgeError {
    BridgeError::ElementNotFound(selector.to_string())
}

#[async_trait]
impl PageDriver for FakePage {
    async fn url(&self) -> Result<Url, BridgeError> {
        self.inner
            .lock()
            .url
            .clone()
            .ok_or_else(|| BridgeError::Unknown("page has no url".to_string()))
    }

    async fn exists(&self, selector: &str) -> Result<bool, BridgeError> {
        Ok(self.inner.lock().present.contains(selector))
    }

    async fn click(&self, selector: &str) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock();
        if !inner.present.contains(selector) {
            return Err(missing(selector));
        }
        inner.clicks.push(selector.to_string());
        if let Some(revealed) = inner.reveal_on_click.get(selector).cloned() {
            inner.present.insert(revealed);
        }
        Ok(())
    }

    async fn read_value(&self, selector: &str) -> Result<String, BridgeError> {
        let inner = self.inner.lock();
        if !inner.present.contains(selector) {
            return Err(missing(selector));
        }
        Ok(inner.values.get(selector).cloned().unwrap_or_default())
    }

    async fn set_value(&self, selector: &str, value: &str) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock();
        if !inner.present.contains(selector) {
            return Err(missing(selector));
        }
        inner
            .values
            .insert(selector.to_string(), value.to_string());
        inner
            .value_history
            .entry(selector.to_string())
            .or_default()
            .push(value.to_string());
        let events = inner.events.entry(selector.to_string()).or_default();
        events.extend(["input", "change", "keyup"].map(String::from));
        Ok(())
    }

    async fn dispatch_paste(&self, selector: &str) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock();
        if !inner.present.contains(selector) {
            return Err(missing(selector));
        }
        inner
            .events
            .entry(selector.to_string())
            .or_default()
            .push("paste".to_string());
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<String, BridgeError> {
        self.inner
            .lock()
            .texts
            .get(selector)
            .cloned()
            .ok_or_else(|| missing(selector))
    }

    async fn click_button_with_text(
        &self,
        text: &str,
        exact: bool,
    ) -> Result<bool, BridgeError> {
        let mut inner = self.inner.lock();
        let hit = inner.buttons.iter().any(|label| {
            if exact {
                label.trim() == text
            } else {
                label.contains(text)
            }
        });
        if hit {
            inner.clicks.push(format!("button:{text}"));
        }
        Ok(hit)
    }

    async fn click_submit_within(&self, anchor_selector: &str) -> Result<bool, BridgeError> {
        let mut inner = self.inner.lock();
        if inner.container_submit {
            inner.clicks.push(format!("submit:{anchor_selector}"));
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn eval(&self, script: &str) -> Result<serde_json::Value, BridgeError> {
        let mut inner = self.inner.lock();
        inner.eval_scripts.push(script.to_string());
        Ok(inner
            .eval_results
            .pop_front()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn navigate(&self, url: &str) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock();
        inner.navigations.push(url.to_string());
        inner.url = Url::parse(url).ok();
        Ok(())
    }

    fn mutations(&self) -> broadcast::Receiver<MutationNotice> {
        self.mutations.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_interactions() {
        let page = FakePage::new("https://www.chess.com/game/live/1");
        page.seed_value("textarea", "old");

        page.set_value("textarea", "new").await.expect("set");
        page.dispatch_paste("textarea").await.expect("paste");

        assert_eq!(page.value_of("textarea").as_deref(), Some("new"));
        assert_eq!(page.value_history("textarea"), vec!["new"]);
        assert_eq!(
            page.events_for("textarea"),
            vec!["input", "change", "keyup", "paste"]
        );
    }

    #[tokio::test]
    async fn click_on_missing_selector_names_it() {
        let page = FakePage::new("https://www.chess.com/game/live/1");
        let err = page.click(".share").await.expect_err("missing");
        assert_eq!(err, BridgeError::ElementNotFound(".share".to_string()));
    }

    #[tokio::test]
    async fn reveal_on_click_scripting() {
        let page = FakePage::new("https://lichess.org/analysis");
        page.present(".trigger");
        page.reveal_on_click(".trigger", ".revealed");

        assert!(!page.exists(".revealed").await.expect("exists"));
        page.click(".trigger").await.expect("click");
        assert!(page.exists(".revealed").await.expect("exists"));
    }

    #[tokio::test]
    async fn mutation_feed_reaches_subscribers() {
        let page = FakePage::new("https://www.chess.com/game/live/1");
        let mut rx = page.mutations();
        page.emit_mutation();
        let notice = rx.recv().await.expect("notice");
        assert!(notice.child_list);
    }
}
