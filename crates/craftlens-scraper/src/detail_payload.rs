//! Product-page payloads and their mappings to [`ProductDetail`].
//!
//! A product page describes itself either through the site's own bootstrap
//! state or through schema.org JSON-LD. The two shapes share almost no key
//! names, so each has its own mapping and they are never merged.

use craftlens_core::{Product, ProductDetail};
use serde_json::{json, Value};

use crate::bootstrap::{linked_data_products, next_data, pointer};
use crate::normalize::{
    clamp_rating, coerce_number, first_text, nested_image, non_negative_int, normalize_product,
    synthetic_id, RawRecord, ARTIST_PLACEHOLDER, ID_CANDIDATES, TITLE_PLACEHOLDER,
};
use crate::site::{last_path_segment, SiteConfig};

/// Title of the detail returned when a page has no structured product block.
pub const UNAVAILABLE_TITLE: &str = "상품 정보를 가져올 수 없습니다";

const SITE_PRODUCT_PATHS: &[&[&str]] = &[
    &["props", "pageProps", "product"],
    &["props", "pageProps", "initialData", "product"],
];

/// A structured product block found in a page.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailPayload {
    /// The site's own product object from `__NEXT_DATA__`.
    SiteProduct(RawRecord),
    /// A schema.org `Product` node from JSON-LD.
    LinkedData(RawRecord),
}

impl DetailPayload {
    /// First structured block in `html`: site state before JSON-LD.
    #[must_use]
    pub fn find(html: &str) -> Option<Self> {
        let site_product = next_data(html).and_then(|root| {
            SITE_PRODUCT_PATHS.iter().find_map(|path| {
                pointer(&root, path)
                    .and_then(Value::as_object)
                    .filter(|obj| !obj.is_empty())
                    .cloned()
            })
        });
        if let Some(raw) = site_product {
            return Some(Self::SiteProduct(raw));
        }
        linked_data_products(html)
            .into_iter()
            .next()
            .map(Self::LinkedData)
    }

    /// Maps the payload to a detail whose `url` is the requested page.
    #[must_use]
    pub fn into_detail(self, url: &str, site: &SiteConfig) -> ProductDetail {
        match self {
            Self::SiteProduct(raw) => site_product_detail(&raw, url, site),
            Self::LinkedData(raw) => linked_data_detail(&raw, url, site),
        }
    }
}

/// Identifier fallback for pages: the URL's last segment, else a hash of it.
fn id_from_url(url: &str) -> String {
    last_path_segment(url).unwrap_or_else(|| synthetic_id(url))
}

fn site_product_detail(raw: &RawRecord, url: &str, site: &SiteConfig) -> ProductDetail {
    let mut record = raw.clone();
    if first_text(raw, ID_CANDIDATES, site).is_none() {
        record.insert("id".to_owned(), json!(id_from_url(url)));
    }

    let Some(mut product) = normalize_product(&record, site) else {
        return placeholder_detail(url);
    };
    product.url = url.to_owned();

    let additional_images = image_list(raw.get("images"), site);
    if product.image.is_empty() {
        if let Some(first) = additional_images.first() {
            product.image.clone_from(first);
        }
    }

    ProductDetail {
        product,
        description: text_field(raw, "description"),
        additional_images,
        options: raw
            .get("options")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        tags: tag_list(raw.get("tags")),
    }
}

fn linked_data_detail(raw: &RawRecord, url: &str, site: &SiteConfig) -> ProductDetail {
    let id = match raw.get("productID") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        _ => id_from_url(url),
    };

    let offer = match raw.get("offers") {
        Some(Value::Array(offers)) => offers.first(),
        other => other,
    };
    let price = offer
        .and_then(|o| o.get("price"))
        .and_then(coerce_number)
        .map_or(0, non_negative_int);

    let aggregate = raw.get("aggregateRating");
    let rating = aggregate
        .and_then(|a| a.get("ratingValue"))
        .and_then(coerce_number)
        .map_or(0.0, clamp_rating);
    let review_count = aggregate
        .and_then(|a| a.get("reviewCount").or_else(|| a.get("ratingCount")))
        .and_then(coerce_number)
        .map_or(0, non_negative_int);

    let (image, additional_images) = match raw.get("image") {
        Some(list @ Value::Array(_)) => {
            let images = image_list(Some(list), site);
            (images.first().cloned().unwrap_or_default(), images)
        }
        Some(single) => (single_image(single, site).unwrap_or_default(), Vec::new()),
        None => (String::new(), Vec::new()),
    };

    let artist_name = match raw.get("brand") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_owned(),
        Some(brand) => brand
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| ARTIST_PLACEHOLDER.to_owned(), str::to_owned),
        None => ARTIST_PLACEHOLDER.to_owned(),
    };

    ProductDetail {
        product: Product {
            id,
            title: text_field(raw, "name").unwrap_or_else(|| TITLE_PLACEHOLDER.to_owned()),
            price,
            original_price: None,
            discount_rate: None,
            image,
            artist_name,
            rating,
            review_count,
            url: url.to_owned(),
            category: text_field(raw, "category"),
        },
        description: text_field(raw, "description"),
        additional_images,
        options: Vec::new(),
        tags: Vec::new(),
    }
}

/// Detail for a page with no structured product block.
#[must_use]
pub fn placeholder_detail(url: &str) -> ProductDetail {
    ProductDetail::from_product(Product {
        id: id_from_url(url),
        title: UNAVAILABLE_TITLE.to_owned(),
        price: 0,
        original_price: None,
        discount_rate: None,
        image: String::new(),
        artist_name: ARTIST_PLACEHOLDER.to_owned(),
        rating: 0.0,
        review_count: 0,
        url: url.to_owned(),
        category: None,
    })
}

fn text_field(raw: &RawRecord, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn single_image(value: &Value, site: &SiteConfig) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(site.absolutize(s)),
        other => nested_image(other, site),
    }
}

/// Image URLs from a list of strings or `{url}` / `{imageUrl}` objects.
fn image_list(value: Option<&Value>, site: &SiteConfig) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| single_image(v, site)).collect())
        .unwrap_or_default()
}

/// Tags as strings or `{name}` objects, in source order.
fn tag_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|tag| match tag {
                    Value::String(s) => Some(s.trim()),
                    other => other.get("name").and_then(Value::as_str).map(str::trim),
                })
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "detail_payload_test.rs"]
mod tests;
