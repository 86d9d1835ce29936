//! Deriving a game id and a player identity from the live page.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use chessbridge_core_types::BridgeError;
use chessbridge_page_probe::{selectors, PageDriver};

fn live_game_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"chess\.com/(?:game/live|live/game)/(\d+)").expect("static pattern")
    })
}

fn member_page() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"chess\.com/(?:member|players)/([A-Za-z0-9_-]+)").expect("static pattern")
    })
}

/// Numeric game id from the known live-game URL shapes, if present.
pub fn game_id_from_url(url: &Url) -> Option<String> {
    live_game_id()
        .captures(url.as_str())
        .map(|caps| caps[1].to_string())
}

/// Username from the known member-page URL shapes, if present.
pub fn username_from_url(url: &Url) -> Option<String> {
    member_page()
        .captures(url.as_str())
        .map(|caps| caps[1].to_string())
}

/// Username from the two on-page player nodes.
///
/// When both players are rendered, the node marked as the logged-in
/// viewer is skipped and the opponent's name is returned. With a
/// single node there is nothing to compare against, so that name is
/// used as-is.
pub async fn username_from_page(
    driver: &dyn PageDriver,
) -> Result<Option<String>, BridgeError> {
    let top = driver
        .inner_text(selectors::PLAYER_TOP_USERNAME)
        .await
        .ok()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    let bottom = driver
        .inner_text(selectors::PLAYER_BOTTOM_USERNAME)
        .await
        .ok()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    match (top, bottom) {
        (Some(top), Some(bottom)) => {
            if driver.exists(selectors::PLAYER_TOP_IS_CURRENT).await? {
                Ok(Some(bottom))
            } else if driver.exists(selectors::PLAYER_BOTTOM_IS_CURRENT).await? {
                Ok(Some(top))
            } else {
                // No marker at all: the opponent is conventionally
                // rendered above the board.
                Ok(Some(top))
            }
        }
        (Some(only), None) | (None, Some(only)) => Ok(Some(only)),
        (None, None) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chessbridge_page_probe::FakePage;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("test url")
    }

    #[test]
    fn extracts_game_id_from_both_live_shapes() {
        assert_eq!(
            game_id_from_url(&url("https://www.chess.com/game/live/9876")),
            Some("9876".to_string())
        );
        assert_eq!(
            game_id_from_url(&url("https://www.chess.com/live/game/9876")),
            Some("9876".to_string())
        );
        assert_eq!(
            game_id_from_url(&url("https://www.chess.com/home")),
            None
        );
    }

    #[test]
    fn extracts_username_from_member_pages() {
        assert_eq!(
            username_from_url(&url("https://www.chess.com/member/anna_k")),
            Some("anna_k".to_string())
        );
        assert_eq!(
            username_from_url(&url("https://www.chess.com/game/live/1")),
            None
        );
    }

    #[tokio::test]
    async fn picks_the_opponent_when_the_viewer_is_marked() {
        let page = FakePage::new("https://www.chess.com/game/live/1");
        page.seed_text(selectors::PLAYER_TOP_USERNAME, "opponent");
        page.seed_text(selectors::PLAYER_BOTTOM_USERNAME, "viewer");
        page.present(selectors::PLAYER_BOTTOM_IS_CURRENT);

        let username = username_from_page(&page).await.expect("probe");
        assert_eq!(username.as_deref(), Some("opponent"));
    }

    #[tokio::test]
    async fn skips_the_marked_top_player() {
        let page = FakePage::new("https://www.chess.com/game/live/1");
        page.seed_text(selectors::PLAYER_TOP_USERNAME, "viewer");
        page.seed_text(selectors::PLAYER_BOTTOM_USERNAME, "opponent");
        page.present(selectors::PLAYER_TOP_IS_CURRENT);

        let username = username_from_page(&page).await.expect("probe");
        assert_eq!(username.as_deref(), Some("opponent"));
    }

    #[tokio::test]
    async fn single_node_is_used_as_is() {
        let page = FakePage::new("https://www.chess.com/game/live/1");
        page.seed_text(selectors::PLAYER_BOTTOM_USERNAME, "  lonely  ");

        let username = username_from_page(&page).await.expect("probe");
        assert_eq!(username.as_deref(), Some("lonely"));
    }

    #[tokio::test]
    async fn no_nodes_means_no_identity() {
        let page = FakePage::new("https://www.chess.com/game/live/1");
        let username = username_from_page(&page).await.expect("probe");
        assert!(username.is_none());
    }
}
