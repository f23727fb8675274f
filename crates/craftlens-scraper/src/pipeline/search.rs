use std::sync::Arc;

use craftlens_core::{SearchParams, SearchResult};

use super::{render_page, RenderTimings, Tier};
use crate::api::ApiResolver;
use crate::browser::BrowserSessions;
use crate::error::ScraperError;
use crate::normalize::{normalize_records, RawRecord};
use crate::site::SiteConfig;
use crate::{dom, page_state};

/// Search with tiered fallback: API, then page state, then DOM heuristics.
pub struct SearchPipeline {
    api: ApiResolver,
    sessions: Arc<BrowserSessions>,
    site: SiteConfig,
    timings: RenderTimings,
}

impl SearchPipeline {
    #[must_use]
    pub fn new(
        api: ApiResolver,
        sessions: Arc<BrowserSessions>,
        site: SiteConfig,
        timings: RenderTimings,
    ) -> Self {
        Self {
            api,
            sessions,
            site,
            timings,
        }
    }

    /// Runs the tiers in order until one yields at least one normalized
    /// product.
    ///
    /// The search page is rendered at most once, and only after the API tier
    /// failed or came back empty; the page-state and DOM tiers read the same
    /// document. Exhausting every tier is not an error.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidParams`] for a blank keyword or zero page/size.
    /// - [`ScraperError::RenderingUnavailable`] when the API tier did not
    ///   produce products and the search page could not be rendered.
    pub async fn search(&self, params: SearchParams) -> Result<SearchResult, ScraperError> {
        let params = params.validated()?;
        let size = usize::try_from(params.size).unwrap_or(usize::MAX);
        let mut page: Option<String> = None;
        let mut state = Some(Tier::Api);

        while let Some(tier) = state {
            let outcome = match tier {
                Tier::Api => self.api.resolve(&params).await,
                Tier::PageState => {
                    let html = self.rendered_page(&mut page, &params).await?;
                    page_state::resolve(html, size, &self.site)
                }
                Tier::Dom => {
                    let html = self.rendered_page(&mut page, &params).await?;
                    Ok(dom::resolve(html, size, &self.site))
                }
            };

            match outcome {
                Ok(raws) => {
                    if let Some(result) = self.finish(tier, &raws, size, &params) {
                        return Ok(result);
                    }
                    tracing::debug!(%tier, keyword = %params.keyword, raw = raws.len(), "tier yielded no products");
                }
                Err(e) => {
                    tracing::warn!(%tier, keyword = %params.keyword, error = %e, "tier failed; falling back");
                }
            }
            state = tier.next();
        }

        tracing::info!(keyword = %params.keyword, "all tiers exhausted; returning empty result");
        Ok(SearchResult::empty(&params))
    }

    /// Normalizes a tier's records; `None` means "advance to the next tier".
    fn finish(
        &self,
        tier: Tier,
        raws: &[RawRecord],
        size: usize,
        params: &SearchParams,
    ) -> Option<SearchResult> {
        let products = normalize_records(raws, &self.site);
        if products.is_empty() {
            return None;
        }
        tracing::info!(%tier, keyword = %params.keyword, count = products.len(), "search resolved");
        Some(SearchResult {
            total: products.len(),
            has_more: raws.len() >= size,
            products,
            keyword: params.keyword.clone(),
            sort: params.sort,
            page: params.page,
            source: Some(tier.source()),
        })
    }

    async fn rendered_page<'a>(
        &self,
        page: &'a mut Option<String>,
        params: &SearchParams,
    ) -> Result<&'a str, ScraperError> {
        if page.is_none() {
            let url = self
                .site
                .search_page_url(&params.keyword, params.sort.page_token())?;
            tracing::debug!(%url, "rendering search page");
            *page = Some(render_page(&self.sessions, &url, self.timings).await?);
        }
        Ok(page.as_deref().unwrap_or_default())
    }
}
