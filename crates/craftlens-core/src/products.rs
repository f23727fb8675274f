use serde::{Deserialize, Serialize};

/// A product as it appears in a search result, normalized from whichever
/// extraction tier produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Native product identifier, or `product-<n>` synthesized from the title.
    pub id: String,
    pub title: String,
    /// Sale price in whole won. `0` when no price could be recovered.
    pub price: u64,
    /// Pre-discount price, present only when the source carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<u64>,
    /// Discount percentage, e.g. `20` for 20%.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<u32>,
    /// Absolute image URL, or empty when none was found.
    pub image: String,
    pub artist_name: String,
    /// Average review score in `[0, 5]`.
    pub rating: f64,
    pub review_count: u64,
    /// Absolute product page URL.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A single product page. Carries everything [`Product`] does plus
/// page-only fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub additional_images: Vec<String>,
    /// Purchase options exactly as the site returned them; shape is not validated.
    #[serde(default)]
    pub options: Vec<serde_json::Value>,
    /// Tags in source order. May contain duplicates.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ProductDetail {
    /// Wraps a [`Product`] with no detail-only data.
    #[must_use]
    pub fn from_product(product: Product) -> Self {
        Self {
            product,
            description: None,
            additional_images: Vec::new(),
            options: Vec::new(),
            tags: Vec::new(),
        }
    }
}
