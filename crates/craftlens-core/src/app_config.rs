use std::path::PathBuf;

/// Browser window size applied to every browsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Scheme + host of the marketplace, e.g. `https://www.idus.com`.
    pub site_origin: String,
    /// Base path for images addressed only by an opaque image id.
    pub image_cdn_base: String,
    pub api_timeout_secs: u64,
    pub navigation_timeout_secs: u64,
    pub script_timeout_secs: u64,
    /// Wait after navigation so client-side rendering can finish.
    pub settle_delay_ms: u64,
    pub user_agent: String,
    pub locale: String,
    pub timezone: String,
    pub viewport: Viewport,
    pub stealth: bool,
    pub chromium_path: Option<PathBuf>,
}
