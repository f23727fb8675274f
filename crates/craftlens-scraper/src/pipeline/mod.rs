//! Orchestration: the tier state machine for search, the structured-block
//! cascade for product pages, and the [`Scraper`] facade wiring both to one
//! shared browser.

mod detail;
mod search;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use craftlens_core::{AppConfig, ProductDetail, ResultSource, SearchParams, SearchResult};
use serde_json::Value;

use crate::api::ApiResolver;
use crate::browser::chromium::ChromiumLauncher;
use crate::browser::{BrowserSessions, ContextProfile};
use crate::error::ScraperError;
use crate::site::SiteConfig;

pub use detail::{extract_detail, DetailPipeline};
pub use search::SearchPipeline;

const OUTER_HTML_JS: &str = "document.documentElement.outerHTML";

/// One independently-failing extraction strategy, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Api,
    PageState,
    Dom,
}

impl Tier {
    /// The tier tried after this one fails; `None` after the last.
    #[must_use]
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Api => Some(Tier::PageState),
            Tier::PageState => Some(Tier::Dom),
            Tier::Dom => None,
        }
    }

    #[must_use]
    pub fn source(self) -> ResultSource {
        match self {
            Tier::Api => ResultSource::Api,
            Tier::PageState => ResultSource::PageState,
            Tier::Dom => ResultSource::Dom,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Api => write!(f, "api"),
            Tier::PageState => write!(f, "page_state"),
            Tier::Dom => write!(f, "dom"),
        }
    }
}

/// Time budgets for loading one rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTimings {
    pub navigation: Duration,
    pub script: Duration,
    /// Fixed wait after navigation so client-side rendering can finish.
    pub settle: Duration,
}

impl RenderTimings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            navigation: Duration::from_secs(config.navigation_timeout_secs),
            script: Duration::from_secs(config.script_timeout_secs),
            settle: Duration::from_millis(config.settle_delay_ms),
        }
    }
}

/// Loads `url` in a fresh context and returns the settled document HTML.
///
/// The context is released on every path. Failures are reported as
/// [`ScraperError::RenderingUnavailable`] (or [`ScraperError::SessionClosed`]
/// after shutdown).
pub(crate) async fn render_page(
    sessions: &BrowserSessions,
    url: &str,
    timings: RenderTimings,
) -> Result<String, ScraperError> {
    let mut lease = sessions.acquire().await.map_err(rendering_unavailable)?;

    let loaded = match lease.navigate(url, timings.navigation).await {
        Ok(initial) => {
            tokio::time::sleep(timings.settle).await;
            match lease.evaluate(OUTER_HTML_JS, timings.script).await {
                Ok(Value::String(settled)) => Ok(settled),
                Ok(other) => {
                    tracing::debug!(kind = json_kind(&other), "settled html was not a string; using initial document");
                    Ok(initial)
                }
                Err(e) => {
                    tracing::warn!(url, error = %e, "could not read settled html; using initial document");
                    Ok(initial)
                }
            }
        }
        Err(e) => Err(rendering_unavailable(e)),
    };

    lease.release().await;
    loaded
}

fn rendering_unavailable(err: ScraperError) -> ScraperError {
    match err {
        ScraperError::SessionClosed | ScraperError::RenderingUnavailable { .. } => err,
        other => ScraperError::RenderingUnavailable {
            reason: other.to_string(),
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Both pipelines over one lazily-launched browser.
pub struct Scraper {
    search: SearchPipeline,
    detail: DetailPipeline,
    sessions: Arc<BrowserSessions>,
}

impl Scraper {
    /// Wires the production stack: `reqwest` for the API tier and a local
    /// Chromium for rendering. The browser is not started until first needed.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let site = SiteConfig::from_app_config(config);
        let api = ApiResolver::new(&site, config.api_timeout_secs, &config.user_agent)?;
        let sessions = Arc::new(BrowserSessions::new(
            Arc::new(ChromiumLauncher::from_app_config(config)),
            ContextProfile::from_app_config(config),
        ));
        Ok(Self::with_parts(
            api,
            sessions,
            site,
            RenderTimings::from_app_config(config),
        ))
    }

    /// Assembles a scraper from explicit parts.
    #[must_use]
    pub fn with_parts(
        api: ApiResolver,
        sessions: Arc<BrowserSessions>,
        site: SiteConfig,
        timings: RenderTimings,
    ) -> Self {
        Self {
            search: SearchPipeline::new(api, Arc::clone(&sessions), site.clone(), timings),
            detail: DetailPipeline::new(Arc::clone(&sessions), site, timings),
            sessions,
        }
    }

    /// # Errors
    ///
    /// See [`SearchPipeline::search`].
    pub async fn search(&self, params: SearchParams) -> Result<SearchResult, ScraperError> {
        self.search.search(params).await
    }

    /// # Errors
    ///
    /// See [`DetailPipeline::detail`].
    pub async fn detail(&self, url: &str) -> Result<ProductDetail, ScraperError> {
        self.detail.detail(url).await
    }

    /// Closes the shared browser. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns the browser's close error.
    pub async fn shutdown(&self) -> Result<(), ScraperError> {
        self.sessions.shutdown().await
    }
}
