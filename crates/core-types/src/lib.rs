//! Shared value types for the chessbridge crates.
//!
//! Everything that crosses a crate boundary lives here: the session
//! state catalog, the portable game record, retrieval outcomes, the
//! error taxonomy, and the single in-flight-injection guard.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy shared by the network and DOM layers.
///
/// Retryability is a property of the category, not the call site:
/// network hiccups and timeouts may be retried, a missing record or a
/// missing element may not.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeError {
    /// Transport-level failure talking to a remote endpoint
    #[error("network error: {0}")]
    Network(String),

    /// Bounded wait elapsed before the operation completed
    #[error("timed out: {0}")]
    Timeout(String),

    /// Provider asked us to back off (HTTP 429)
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The requested record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A page control was absent (page structure changed or dismissed)
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// Anything we could not classify
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl BridgeError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Network(_) | BridgeError::Timeout(_) | BridgeError::RateLimited(_)
        )
    }

    /// Get error severity level (0=low, 1=medium, 2=high)
    pub fn severity(&self) -> u8 {
        match self {
            BridgeError::Unknown(_) => 2,
            BridgeError::Network(_) | BridgeError::Timeout(_) | BridgeError::RateLimited(_) => 1,
            BridgeError::NotFound(_) | BridgeError::ElementNotFound(_) => 0,
        }
    }
}

/// Phase of a game session as read from the live source page.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    /// The current document does not belong to the source site
    NotTargetSite,
    /// On the source site, but no game markers present
    NoSession,
    /// A clock is running and no finished marker is present
    SessionActive,
    /// The finished marker is present
    SessionComplete,
}

/// Indicator color shown by the control surface for a session kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum IndicatorColor {
    Green,
    Yellow,
    Gray,
    White,
}

/// Immutable session-state value broadcast between contexts.
///
/// Replaced wholesale on every detection pass; equality for
/// transition purposes is by `kind` only. The `message_key` is a
/// catalog key for the control surface, never localized text.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SessionState {
    pub kind: SessionKind,
    pub message_key: &'static str,
    pub indicator: IndicatorColor,
    pub actionable: bool,
}

impl SessionState {
    /// The one state value for a given kind.
    pub fn for_kind(kind: SessionKind) -> Self {
        match kind {
            SessionKind::NotTargetSite => Self {
                kind,
                message_key: "state.notChessSite",
                indicator: IndicatorColor::Gray,
                actionable: false,
            },
            SessionKind::NoSession => Self {
                kind,
                message_key: "state.noGameDetected",
                indicator: IndicatorColor::Gray,
                actionable: false,
            },
            SessionKind::SessionActive => Self {
                kind,
                message_key: "state.gameInProgress",
                indicator: IndicatorColor::Yellow,
                actionable: false,
            },
            SessionKind::SessionComplete => Self {
                kind,
                message_key: "state.gameFinished",
                indicator: IndicatorColor::Green,
                actionable: true,
            },
        }
    }

    /// Transition test: only a kind change counts.
    pub fn same_kind(&self, other: &SessionState) -> bool {
        self.kind == other.kind
    }
}

/// One side of a finished game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub username: String,
    pub rating: u32,
}

/// Final score of a game, rendered in standard notation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    Unknown,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let score = match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "½-½",
            GameResult::Unknown => "Unknown",
        };
        write!(f, "{score}")
    }
}

/// Portable record of one finished game.
///
/// Built from a provider payload, immutable afterwards. Owned by the
/// component that fetched it until handed to the injection pipeline,
/// which only reads it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub url: String,
    pub white: PlayerSummary,
    pub black: PlayerSummary,
    pub result: GameResult,
    pub time_control: String,
    pub end_time: DateTime<Utc>,
    pub movetext: String,
}

impl GameRecord {
    /// Label for lists and logs: "white (1500) vs black (1480)".
    pub fn pairing(&self) -> String {
        format!(
            "{} ({}) vs {} ({})",
            self.white.username, self.white.rating, self.black.username, self.black.rating
        )
    }
}

/// Tagged result of one retrieval attempt. Never a bare null: every
/// failure carries a reason for diagnosis.
#[derive(Clone, Debug)]
pub enum RetrievalOutcome {
    Success(String),
    Failure(BridgeError),
}

impl RetrievalOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RetrievalOutcome::Success(_))
    }

    /// Movetext on success, error otherwise.
    pub fn into_result(self) -> Result<String, BridgeError> {
        match self {
            RetrievalOutcome::Success(movetext) => Ok(movetext),
            RetrievalOutcome::Failure(err) => Err(err),
        }
    }
}

/// Appearance theme for the control surface.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeOption {
    Light,
    Dark,
    System,
}

/// User settings shared across contexts.
///
/// Every field has a default so a missing storage key never fails a
/// read; unknown keys in stored JSON are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub language: String,
    pub theme: ThemeOption,
    pub notifications: bool,
    pub auto_open_analysis: bool,
    pub source_username: Option<String>,
    pub has_seen_welcome: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            theme: ThemeOption::System,
            notifications: true,
            auto_open_analysis: false,
            source_username: None,
            has_seen_welcome: false,
        }
    }
}

/// Guard allowing at most one record to be mid-injection at a time.
///
/// Process-local per context; rapid repeated selections while a
/// permit is held are no-ops, not queued retries.
#[derive(Clone, Default)]
pub struct PendingInjection {
    busy: Arc<AtomicBool>,
}

impl PendingInjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the permit, or `None` while an injection is in flight.
    pub fn begin(&self) -> Option<InjectionPermit> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(InjectionPermit {
                busy: self.busy.clone(),
            })
        } else {
            None
        }
    }

    pub fn in_flight(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one injection; released on drop, success
/// or failure alike.
pub struct InjectionPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for InjectionPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
