//! Site addressing: origin, product URLs, image CDN paths, and the
//! absolutizing rule every emitted URL passes through.

use craftlens_core::AppConfig;
use url::Url;

use crate::error::ScraperError;

/// Where the marketplace lives. Cheap to clone; shared read-only by every
/// resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Scheme + host with no trailing slash, e.g. `https://www.idus.com`.
    pub origin: String,
    /// Prefix for images known only by an opaque id.
    pub image_cdn_base: String,
}

impl SiteConfig {
    #[must_use]
    pub fn new(origin: &str, image_cdn_base: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            image_cdn_base: image_cdn_base.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(&config.site_origin, &config.image_cdn_base)
    }

    /// Rewrites protocol-relative (`//host/x`) and root-relative (`/x`)
    /// references to absolute URLs. Absolute and empty inputs are returned
    /// trimmed; bare relative paths are joined onto the origin.
    #[must_use]
    pub fn absolutize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        if let Some(rest) = trimmed.strip_prefix("//") {
            return format!("https://{rest}");
        }
        if trimmed.starts_with("http://")
            || trimmed.starts_with("https://")
            || trimmed.starts_with("data:")
        {
            return trimmed.to_string();
        }
        if trimmed.starts_with('/') {
            return format!("{}{trimmed}", self.origin);
        }
        Url::parse(&format!("{}/", self.origin))
            .and_then(|base| base.join(trimmed))
            .map_or_else(
                |_| format!("{}/{trimmed}", self.origin),
                |u| u.to_string(),
            )
    }

    /// Canonical product page for a product id.
    #[must_use]
    pub fn product_url(&self, id: &str) -> String {
        format!("{}/w/product/{id}", self.origin)
    }

    /// CDN location of an image known only by its opaque id.
    #[must_use]
    pub fn image_url_from_id(&self, image_id: &str) -> String {
        format!("{}/{image_id}_720.jpg", self.image_cdn_base)
    }

    /// Rendered search page for a keyword and sort token.
    pub(crate) fn search_page_url(&self, keyword: &str, order: &str) -> Result<String, ScraperError> {
        let mut url =
            Url::parse(&format!("{}/v2/search", self.origin)).map_err(|e| {
                ScraperError::InvalidUrl {
                    url: self.origin.clone(),
                    reason: e.to_string(),
                }
            })?;
        url.query_pairs_mut()
            .append_pair("keyword", keyword)
            .append_pair("order", order);
        Ok(url.to_string())
    }

    /// Internal search endpoint used by the API tier.
    pub(crate) fn search_api_url(&self) -> String {
        format!("{}/v2/www-api/search/review-unit", self.origin)
    }
}

/// Checks that `url` is an absolute `http(s)` URL with a host.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] otherwise.
pub fn validate_product_url(url: &str) -> Result<Url, ScraperError> {
    let parsed = Url::parse(url.trim()).map_err(|e| ScraperError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: "expected an absolute http(s) URL".to_owned(),
        });
    }
    Ok(parsed)
}

/// Last non-empty path segment of a URL, ignoring query and fragment.
///
/// `https://www.idus.com/w/product/abc-123?from=search` → `abc-123`.
#[must_use]
pub fn last_path_segment(url: &str) -> Option<String> {
    if let Ok(parsed) = Url::parse(url) {
        return parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .map(str::to_owned);
    }
    // fallback for scheme-less input
    url.split(['?', '#'])
        .next()
        .unwrap_or_default()
        .split('/')
        .rfind(|s| !s.is_empty())
        .map(str::to_owned)
}
