//! Driver configuration and browser-binary discovery.

use std::path::PathBuf;

use which::which;

/// Launch configuration for the managed Chromium instance.
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Run without a visible window. Watching a live game needs a
    /// visible one, so this defaults off.
    pub headless: bool,

    /// Explicit browser binary; discovered on the PATH when absent.
    pub executable: Option<PathBuf>,

    /// Initial window size.
    pub window: Option<(u32, u32)>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: false,
            executable: None,
            window: Some((1280, 900)),
        }
    }
}

/// Candidate binary names, most specific first.
const BROWSER_BINARIES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Find a usable browser binary on the PATH.
pub fn discover_browser() -> Option<PathBuf> {
    BROWSER_BINARIES
        .iter()
        .find_map(|name| which(name).ok())
}
