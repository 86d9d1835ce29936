//! Third-party DOM contracts, kept as configuration constants.
//!
//! These selectors are versioned by the external sites, not by this
//! crate; when a site ships a redesign the constants change, nothing
//! else does.

/// Hostname fragment identifying the source site.
pub const SOURCE_HOST: &str = "chess.com";

/// Hostname fragment identifying the target site.
pub const TARGET_HOST: &str = "lichess.org";

/// Path prefix of the target site's analysis board.
pub const TARGET_ANALYSIS_PATH: &str = "/analysis";

/// Path prefix of the target site's study pages.
pub const TARGET_STUDY_PATH: &str = "/study/";

// Source site: session-phase markers.

/// Game-over modal, outer node.
pub const GAME_OVER_MODAL: &str = ".game-over-modal";

/// Game-over modal, content node (present in some layouts without the
/// outer class).
pub const GAME_OVER_MODAL_CONTENT: &str = ".game-over-modal-content";

/// Running clock inside the board area.
pub const BOARD_CLOCK: &str = ".board-modal-container .clock-component";

/// Evaluation bar shown in analysis layouts; its presence means this
/// is a replay, not a live game.
pub const EVAL_BAR: &str = ".board-layout-evaluation";

// Source site: share-dialog controls.

/// Share control, also doubles as a finished-game marker.
pub const SHARE_CONTROL: &str = ".share";

/// PGN tab inside the share dialog.
pub const SHARE_PGN_TAB: &str = "#tab-pgn";

/// Textarea holding the PGN inside the share dialog.
pub const SHARE_PGN_TEXTAREA: &str = ".share-menu-tab-pgn-textarea";

/// Close control of the share dialog.
pub const SHARE_CLOSE: &str = ".cc-modal-header-close";

// Source site: player identity.

/// Username node of the player rendered above the board.
pub const PLAYER_TOP_USERNAME: &str = ".player-component.player-top .user-username-component";

/// Username node of the player rendered below the board.
pub const PLAYER_BOTTOM_USERNAME: &str =
    ".player-component.player-bottom .user-username-component";

/// Marker variant carried by the top username node when it belongs to
/// the logged-in viewer.
pub const PLAYER_TOP_IS_CURRENT: &str =
    ".player-component.player-top .user-username-component--mine";

/// Marker variant carried by the bottom username node when it belongs
/// to the logged-in viewer.
pub const PLAYER_BOTTOM_IS_CURRENT: &str =
    ".player-component.player-bottom .user-username-component--mine";

// Target site: analysis-board import controls.

/// PGN input control on the analysis board.
pub const PGN_INPUT: &str = "textarea.copyable[spellcheck=\"false\"]";

/// Exact visible text of the import action button.
pub const IMPORT_BUTTON_TEXT: &str = "Import PGN";

/// Discoverable triggers that open the PGN import pane when the input
/// control is not rendered yet.
pub const OPEN_IMPORT_TRIGGERS: &[&str] = &["a[href*=\"paste\"]", ".pgn-import", "a[title*=\"PGN\"]"];
