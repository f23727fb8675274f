//! API tier: the site's internal JSON search endpoint.

use std::time::Duration;

use craftlens_core::SearchParams;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::error::ScraperError;
use crate::normalize::{objects_only, RawRecord};
use crate::pipeline::Tier;
use crate::site::SiteConfig;

/// Candidate locations of the item array, tried in order.
const ITEM_ARRAY_PATHS: &[&[&str]] = &[&["products"], &["items"], &["data", "products"]];

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    keyword: &'a str,
    sort: &'static str,
    page: u32,
    size: u32,
}

/// Client for the internal search endpoint.
///
/// One request per search; any failure is reported as an error and the
/// caller moves on to the rendered-page tiers.
#[derive(Debug, Clone)]
pub struct ApiResolver {
    client: Client,
    endpoint: String,
    referer: String,
}

impl ApiResolver {
    /// Builds the resolver with a request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(site: &SiteConfig, timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint: site.search_api_url(),
            referer: format!("{}/", site.origin),
        })
    }

    /// Posts one search request and returns the raw item array unmodified.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`] on network failure or timeout.
    /// - [`ScraperError::UnexpectedStatus`] for any non-2xx status.
    /// - [`ScraperError::Deserialize`] when the body is not JSON.
    /// - [`ScraperError::TierUnavailable`] when no item array is present.
    pub async fn resolve(&self, params: &SearchParams) -> Result<Vec<RawRecord>, ScraperError> {
        let body = SearchRequest {
            keyword: &params.keyword,
            sort: params.sort.api_token(),
            page: params.page,
            size: params.size,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9")
            .header(reqwest::header::REFERER, &self.referer)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let text = response.text().await?;
        let parsed: Value = serde_json::from_str(&text).map_err(|e| ScraperError::Deserialize {
            context: format!("search response for \"{}\"", params.keyword),
            source: e,
        })?;

        let items = item_array(parsed).ok_or_else(|| {
            ScraperError::unavailable(Tier::Api, "response carries no product array")
        })?;

        tracing::debug!(keyword = %params.keyword, count = items.len(), "api tier response");
        Ok(objects_only(items))
    }
}

/// First present item array: `products`, `items`, then `data.products`.
fn item_array(mut body: Value) -> Option<Vec<Value>> {
    ITEM_ARRAY_PATHS.iter().find_map(|path| {
        let mut node = &mut body;
        for key in *path {
            node = node.as_object_mut()?.get_mut(*key)?;
        }
        match node.take() {
            Value::Array(items) => Some(items),
            other => {
                *node = other;
                None
            }
        }
    })
}
