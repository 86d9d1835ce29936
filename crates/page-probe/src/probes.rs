//! Stateless predicates over the current document.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use chessbridge_core_types::BridgeError;

use crate::driver::PageDriver;
use crate::selectors;

/// Coarse classification of a document by URL shape alone.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageKind {
    /// A live or archived game page on the source site.
    SourceGame,
    /// A plain game page on the target site.
    TargetGame,
    /// The target site's analysis board.
    TargetAnalysis,
    /// A study page on the target site.
    TargetStudy,
    Other,
}

fn target_game_slug() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/[a-zA-Z0-9]{8,12}(?:/(?:white|black))?$").expect("static pattern")
    })
}

fn host_contains(url: &Url, fragment: &str) -> bool {
    url.host_str().is_some_and(|host| host.contains(fragment))
}

/// Does this URL belong to the source site?
pub fn is_source_site(url: &Url) -> bool {
    host_contains(url, selectors::SOURCE_HOST)
}

/// Does this URL belong to the target site?
pub fn is_target_site(url: &Url) -> bool {
    host_contains(url, selectors::TARGET_HOST)
}

/// Is this the target site's analysis board?
pub fn is_target_analysis_page(url: &Url) -> bool {
    is_target_site(url) && url.path().starts_with(selectors::TARGET_ANALYSIS_PATH)
}

/// Classify a document by its URL shape.
pub fn page_kind(url: &Url) -> PageKind {
    if is_source_site(url) {
        let path = url.path();
        if path.contains("/game/") || path.contains("/live/") {
            return PageKind::SourceGame;
        }
        return PageKind::Other;
    }

    if is_target_site(url) {
        let path = url.path();
        if path.starts_with(selectors::TARGET_ANALYSIS_PATH) {
            return PageKind::TargetAnalysis;
        }
        if path.starts_with(selectors::TARGET_STUDY_PATH) {
            return PageKind::TargetStudy;
        }
        if target_game_slug().is_match(path) {
            return PageKind::TargetGame;
        }
    }

    PageKind::Other
}

/// Is the "session finished" marker set present?
pub async fn finished_marker_present(driver: &dyn PageDriver) -> Result<bool, BridgeError> {
    Ok(driver.exists(selectors::GAME_OVER_MODAL_CONTENT).await?
        || driver.exists(selectors::GAME_OVER_MODAL).await?
        || driver.exists(selectors::SHARE_CONTROL).await?)
}

/// Is the "session active" marker set present? A running clock with no
/// evaluation bar; replays render the clock too but always carry the
/// evaluation bar.
pub async fn active_marker_present(driver: &dyn PageDriver) -> Result<bool, BridgeError> {
    Ok(driver.exists(selectors::BOARD_CLOCK).await?
        && !driver.exists(selectors::EVAL_BAR).await?)
}

/// Everything the state detector needs from one document, collected
/// in a single pass so detection itself stays pure and synchronous.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageFacts {
    pub on_source_site: bool,
    pub finished_marker: bool,
    pub active_marker: bool,
}

impl PageFacts {
    pub async fn collect(driver: &dyn PageDriver) -> Result<Self, BridgeError> {
        let url = driver.url().await?;
        if !is_source_site(&url) {
            return Ok(Self::default());
        }
        Ok(Self {
            on_source_site: true,
            finished_marker: finished_marker_present(driver).await?,
            active_marker: active_marker_present(driver).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakePage;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("test url")
    }

    #[test]
    fn classifies_urls_by_shape() {
        assert_eq!(
            page_kind(&url("https://www.chess.com/game/live/1234")),
            PageKind::SourceGame
        );
        assert_eq!(
            page_kind(&url("https://www.chess.com/live/game/1234")),
            PageKind::SourceGame
        );
        assert_eq!(
            page_kind(&url("https://lichess.org/analysis")),
            PageKind::TargetAnalysis
        );
        assert_eq!(
            page_kind(&url("https://lichess.org/study/abc123de")),
            PageKind::TargetStudy
        );
        assert_eq!(
            page_kind(&url("https://lichess.org/AbCd1234/white")),
            PageKind::TargetGame
        );
        assert_eq!(page_kind(&url("https://example.com/")), PageKind::Other);
        assert_eq!(
            page_kind(&url("https://www.chess.com/home")),
            PageKind::Other
        );
    }

    #[tokio::test]
    async fn facts_off_site_are_empty() {
        let page = FakePage::new("https://example.com/");
        page.present(selectors::GAME_OVER_MODAL);

        let facts = PageFacts::collect(&page).await.expect("facts");
        assert_eq!(facts, PageFacts::default());
    }

    #[tokio::test]
    async fn finished_marker_wins_any_of_three_selectors() {
        let page = FakePage::new("https://www.chess.com/game/live/1");
        assert!(!finished_marker_present(&page).await.expect("probe"));

        page.present(selectors::SHARE_CONTROL);
        assert!(finished_marker_present(&page).await.expect("probe"));
    }

    #[tokio::test]
    async fn active_marker_requires_clock_without_eval_bar() {
        let page = FakePage::new("https://www.chess.com/game/live/1");
        page.present(selectors::BOARD_CLOCK);
        assert!(active_marker_present(&page).await.expect("probe"));

        page.present(selectors::EVAL_BAR);
        assert!(!active_marker_present(&page).await.expect("probe"));
    }
}
