//! Transient on-page outcome banner.
//!
//! Injection runs after navigation already happened, so its failures
//! cannot be rolled back into a caller error; they surface to the
//! user where the user is looking.

use tracing::debug;

use chessbridge_page_probe::PageDriver;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BannerKind {
    Success,
    Error,
}

impl BannerKind {
    fn class(&self) -> &'static str {
        match self {
            BannerKind::Success => "chessbridge-banner success",
            BannerKind::Error => "chessbridge-banner error",
        }
    }

    fn linger_ms(&self) -> u32 {
        match self {
            BannerKind::Success => 1500,
            BannerKind::Error => 3000,
        }
    }
}

/// Show a transient banner. Best-effort: a page that refuses the
/// script only loses the notice, never the operation.
pub async fn show_banner(driver: &dyn PageDriver, kind: BannerKind, text: &str) {
    let script = format!(
        r#"(() => {{
            const banner = document.createElement('div');
            banner.className = {class};
            banner.textContent = {text};
            document.body.appendChild(banner);
            setTimeout(() => banner.remove(), {linger});
        }})()"#,
        class = serde_json::to_string(kind.class()).unwrap_or_default(),
        text = serde_json::to_string(text).unwrap_or_default(),
        linger = kind.linger_ms(),
    );

    if let Err(err) = driver.eval(&script).await {
        debug!(error = %err, "banner injection failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chessbridge_page_probe::FakePage;

    #[tokio::test]
    async fn banner_script_carries_text_and_class() {
        let page = FakePage::new("https://lichess.org/analysis");
        show_banner(&page, BannerKind::Error, "could not load the game").await;

        let scripts = page.eval_scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("chessbridge-banner error"));
        assert!(scripts[0].contains("could not load the game"));
        assert!(scripts[0].contains("3000"));
    }
}
