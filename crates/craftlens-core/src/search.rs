use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::products::Product;
use crate::ParamsError;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 24;

/// Canonical sort names accepted from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Popular,
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
}

impl SortOrder {
    /// Token understood by the site's internal search endpoint.
    #[must_use]
    pub fn api_token(self) -> &'static str {
        match self {
            SortOrder::Popular => "POPULAR",
            SortOrder::Newest => "NEWEST",
            SortOrder::PriceAsc => "PRICE_ASC",
            SortOrder::PriceDesc => "PRICE_DESC",
            SortOrder::Rating => "REVIEW_AVG",
        }
    }

    /// Value of the `order` query parameter on the rendered search page.
    #[must_use]
    pub fn page_token(self) -> &'static str {
        match self {
            SortOrder::Popular => "popular",
            SortOrder::Newest => "recent",
            SortOrder::PriceAsc => "price_asc",
            SortOrder::PriceDesc => "price_desc",
            SortOrder::Rating => "rating",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Popular => write!(f, "popular"),
            SortOrder::Newest => write!(f, "newest"),
            SortOrder::PriceAsc => write!(f, "price_asc"),
            SortOrder::PriceDesc => write!(f, "price_desc"),
            SortOrder::Rating => write!(f, "rating"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "popular" => Ok(SortOrder::Popular),
            "newest" => Ok(SortOrder::Newest),
            "price_asc" => Ok(SortOrder::PriceAsc),
            "price_desc" => Ok(SortOrder::PriceDesc),
            "rating" => Ok(SortOrder::Rating),
            other => Err(ParamsError::UnknownSort(other.to_string())),
        }
    }
}

/// Input to a search run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub keyword: String,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl SearchParams {
    /// Builds params with default sort, page 1 and the default page size.
    #[must_use]
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            sort: SortOrder::default(),
            page: default_page(),
            size: default_size(),
        }
    }

    /// Checks the caller-facing constraints and trims the keyword.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError`] for a blank keyword or a zero page/size.
    pub fn validated(mut self) -> Result<Self, ParamsError> {
        let trimmed = self.keyword.trim();
        if trimmed.is_empty() {
            return Err(ParamsError::EmptyKeyword);
        }
        if self.page == 0 {
            return Err(ParamsError::NotPositive { field: "page" });
        }
        if self.size == 0 {
            return Err(ParamsError::NotPositive { field: "size" });
        }
        self.keyword = trimmed.to_string();
        Ok(self)
    }
}

/// Which tier produced a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Api,
    PageState,
    Dom,
}

/// Output of a search run. An empty `products` list is a valid outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub products: Vec<Product>,
    pub total: usize,
    pub has_more: bool,
    pub keyword: String,
    pub sort: SortOrder,
    pub page: u32,
    /// `None` when every tier came back empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ResultSource>,
}

impl SearchResult {
    /// The result returned when no tier produced a product.
    #[must_use]
    pub fn empty(params: &SearchParams) -> Self {
        Self {
            products: Vec::new(),
            total: 0,
            has_more: false,
            keyword: params.keyword.clone(),
            sort: params.sort,
            page: params.page,
            source: None,
        }
    }
}
