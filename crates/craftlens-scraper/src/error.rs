use craftlens_core::ParamsError;
use thiserror::Error;

use crate::pipeline::Tier;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("{tier} tier unavailable: {reason}")]
    TierUnavailable { tier: Tier, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("rendering surface unavailable: {reason}")]
    RenderingUnavailable { reason: String },

    #[error("invalid product URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("browser session has been shut down")]
    SessionClosed,

    #[error("invalid search parameters: {0}")]
    InvalidParams(#[from] ParamsError),
}

impl ScraperError {
    pub(crate) fn unavailable(tier: Tier, reason: impl Into<String>) -> Self {
        ScraperError::TierUnavailable {
            tier,
            reason: reason.into(),
        }
    }
}
