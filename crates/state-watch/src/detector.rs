//! Pure session-state detection.

use chessbridge_core_types::{SessionKind, SessionState};
use chessbridge_page_probe::PageFacts;

/// Map collected page facts to a session state.
///
/// Predicates are evaluated in fixed priority order. The finished
/// marker is checked before the active marker: both sets can be
/// transiently present while the game-over modal animates in, and a
/// finished game must never be reported as in progress.
pub fn detect(facts: &PageFacts) -> SessionState {
    let kind = if !facts.on_source_site {
        SessionKind::NotTargetSite
    } else if facts.finished_marker {
        SessionKind::SessionComplete
    } else if facts.active_marker {
        SessionKind::SessionActive
    } else {
        SessionKind::NoSession
    };
    SessionState::for_kind(kind)
}
