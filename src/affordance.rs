//! On-page affordance for a finished game.
//!
//! When auto-open is off, the watcher drops a floating notice onto
//! the source page so the user knows the game is ready to export.
//! Idempotent per page: re-injection while the notice is up is a
//! no-op.

use tracing::debug;

use chessbridge_page_probe::PageDriver;

const AFFORDANCE_CLASS: &str = "chessbridge-ready-notice";

/// Inject the notice. Best-effort: a refused script only loses the
/// visual hint, never the export path.
pub async fn inject(driver: &dyn PageDriver) {
    let script = format!(
        r#"(() => {{
            if (document.querySelector('.{class}')) {{ return; }}
            const notice = document.createElement('div');
            notice.className = '{class}';
            notice.textContent = 'Game finished — ready to analyze on Lichess';
            notice.title = 'Trigger the export from the chessbridge control surface';
            document.body.appendChild(notice);
        }})()"#,
        class = AFFORDANCE_CLASS,
    );

    if let Err(err) = driver.eval(&script).await {
        debug!(error = %err, "affordance injection failed");
    }
}
