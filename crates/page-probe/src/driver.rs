//! The driver trait every page interaction goes through.

use async_trait::async_trait;
use tokio::sync::broadcast;
use url::Url;

use chessbridge_core_types::BridgeError;

/// One coalesced batch of DOM mutations.
///
/// Batching is done by the underlying observation primitive (the
/// page-world MutationObserver), not by consumers; a notice may cover
/// many raw mutations.
#[derive(Clone, Copy, Debug)]
pub struct MutationNotice {
    /// Child nodes were added or removed somewhere in the subtree.
    pub child_list: bool,
    /// A `class` attribute changed somewhere in the subtree.
    pub class_attr: bool,
}

impl MutationNotice {
    pub fn any() -> Self {
        Self {
            child_list: true,
            class_attr: true,
        }
    }
}

/// Asynchronous handle on one live document.
///
/// All methods are non-blocking suspensions; none of them retry
/// internally. A missing element surfaces as
/// [`BridgeError::ElementNotFound`] carrying the selector, so callers
/// can attach an operation-specific reason.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Current document URL.
    async fn url(&self) -> Result<Url, BridgeError>;

    /// Whether at least one node matches the selector.
    async fn exists(&self, selector: &str) -> Result<bool, BridgeError>;

    /// Click the first node matching the selector.
    async fn click(&self, selector: &str) -> Result<(), BridgeError>;

    /// Read a form control's value.
    async fn read_value(&self, selector: &str) -> Result<String, BridgeError>;

    /// Set a form control's value and dispatch synthetic `input`,
    /// `change` and `keyup` events so the host page's own parsing
    /// logic runs.
    async fn set_value(&self, selector: &str, value: &str) -> Result<(), BridgeError>;

    /// Dispatch a synthetic clipboard paste at the control. Some host
    /// page versions listen for paste instead of input.
    async fn dispatch_paste(&self, selector: &str) -> Result<(), BridgeError>;

    /// Visible text content of the first matching node.
    async fn inner_text(&self, selector: &str) -> Result<String, BridgeError>;

    /// Find a button whose visible text matches `text` and click it.
    /// Returns whether a button was clicked; absence is not an error
    /// here because callers fall through to other activation paths.
    async fn click_button_with_text(&self, text: &str, exact: bool) -> Result<bool, BridgeError>;

    /// Starting from `anchor_selector`, walk up to the nearest import
    /// wrapper and click its generic submit control, if any.
    async fn click_submit_within(&self, anchor_selector: &str) -> Result<bool, BridgeError>;

    /// Evaluate a script in the page, returning its JSON value.
    async fn eval(&self, script: &str) -> Result<serde_json::Value, BridgeError>;

    /// Navigate this page to a new URL.
    async fn navigate(&self, url: &str) -> Result<(), BridgeError>;

    /// Subscribe to the coalesced mutation feed for this document.
    fn mutations(&self) -> broadcast::Receiver<MutationNotice>;
}
