use std::sync::Arc;

use craftlens_core::ProductDetail;

use super::{render_page, RenderTimings};
use crate::browser::BrowserSessions;
use crate::detail_payload::{placeholder_detail, DetailPayload};
use crate::error::ScraperError;
use crate::site::{validate_product_url, SiteConfig};

/// Product-page extraction: site state, then JSON-LD, then a placeholder.
pub struct DetailPipeline {
    sessions: Arc<BrowserSessions>,
    site: SiteConfig,
    timings: RenderTimings,
}

impl DetailPipeline {
    #[must_use]
    pub fn new(sessions: Arc<BrowserSessions>, site: SiteConfig, timings: RenderTimings) -> Self {
        Self {
            sessions,
            site,
            timings,
        }
    }

    /// Renders a product page and extracts its detail.
    ///
    /// A page without any structured product block yields the placeholder
    /// detail, not an error.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] unless `url` is an absolute `http(s)` URL.
    /// - [`ScraperError::RenderingUnavailable`] when the page cannot be loaded.
    pub async fn detail(&self, url: &str) -> Result<ProductDetail, ScraperError> {
        validate_product_url(url)?;
        let url = url.trim();
        let html = render_page(&self.sessions, url, self.timings).await?;
        Ok(extract_detail(&html, url, &self.site))
    }
}

/// Detail from an already-rendered product page.
#[must_use]
pub fn extract_detail(html: &str, url: &str, site: &SiteConfig) -> ProductDetail {
    match DetailPayload::find(html) {
        Some(payload) => {
            let kind = match &payload {
                DetailPayload::SiteProduct(_) => "site_product",
                DetailPayload::LinkedData(_) => "linked_data",
            };
            tracing::debug!(url, kind, "product block found");
            payload.into_detail(url, site)
        }
        None => {
            tracing::info!(url, "no structured product block; returning placeholder");
            placeholder_detail(url)
        }
    }
}
