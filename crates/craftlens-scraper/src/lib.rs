//! Multi-tier product scraping for idus.com.
//!
//! Search runs the internal JSON API first, then the rendered page's
//! bootstrap state, then heuristics over rendered product links. Every tier's
//! records pass through [`normalize`] before they are returned.

pub mod api;
pub mod bootstrap;
pub mod browser;
pub mod detail_payload;
pub mod dom;
pub mod error;
pub mod heuristics;
pub mod normalize;
pub mod page_state;
pub mod pipeline;
pub mod site;

pub use api::ApiResolver;
pub use browser::chromium::ChromiumLauncher;
pub use browser::{
    BrowserLauncher, BrowserSession, BrowserSessions, BrowsingContext, ContextLease,
    ContextProfile,
};
pub use detail_payload::{DetailPayload, UNAVAILABLE_TITLE};
pub use error::ScraperError;
pub use normalize::{normalize_product, RawRecord};
pub use pipeline::{
    extract_detail, DetailPipeline, RenderTimings, Scraper, SearchPipeline, Tier,
};
pub use site::SiteConfig;
