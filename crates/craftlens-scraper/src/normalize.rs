//! Normalization from heterogeneous raw records to [`craftlens_core::Product`].
//!
//! Every tier hands back loosely-shaped JSON objects whose key names depend on
//! which part of the site produced them. Each canonical field is resolved from
//! a static, ordered table of candidate key paths; the first candidate holding
//! a non-empty value of the expected kind wins. Candidates are never merged.
//!
//! Normalization is total: a value of the wrong type only degrades that field
//! to its default. The one hard requirement is that a record carries an
//! identifier or a title; records with neither are dropped.

use craftlens_core::Product;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::site::SiteConfig;

/// An untyped record as produced by any resolver tier.
pub type RawRecord = Map<String, Value>;

/// Title used when a record has an identifier but no name.
pub const TITLE_PLACEHOLDER: &str = "상품명 없음";

/// Artist name used when a record does not say who made it.
pub const ARTIST_PLACEHOLDER: &str = "작가";

const MAX_RATING: f64 = 5.0;
const MAX_DISCOUNT_RATE: u32 = 100;
const SYNTHETIC_ID_MODULUS: u64 = 100_000;

/// What a candidate's value must look like to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expect {
    /// Non-blank string.
    Text,
    /// Non-blank string or integer.
    Identifier,
    /// Number, or a string that parses as one (`"10,000"`, `"8000원"`).
    Number,
    /// Non-blank URL string; absolutized.
    Url,
    /// Object carrying a `url` or `imageUrl` string; absolutized.
    NestedImage,
    /// Array whose first element is a URL string or a nested image object.
    ImageList,
    /// Opaque image id turned into a CDN URL.
    ImageId,
}

/// One entry in a field's candidate table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub(crate) path: &'static [&'static str],
    pub(crate) expect: Expect,
}

const fn candidate(path: &'static [&'static str], expect: Expect) -> Candidate {
    Candidate { path, expect }
}

pub(crate) const ID_CANDIDATES: &[Candidate] = &[
    candidate(&["uuid"], Expect::Identifier),
    candidate(&["id"], Expect::Identifier),
    candidate(&["productId"], Expect::Identifier),
    candidate(&["productUuid"], Expect::Identifier),
];

pub(crate) const TITLE_CANDIDATES: &[Candidate] = &[
    candidate(&["name"], Expect::Text),
    candidate(&["title"], Expect::Text),
    candidate(&["productName"], Expect::Text),
];

pub(crate) const PRICE_CANDIDATES: &[Candidate] = &[
    candidate(&["price"], Expect::Number),
    candidate(&["salePrice"], Expect::Number),
    candidate(&["sellingPrice"], Expect::Number),
];

const ORIGINAL_PRICE_CANDIDATES: &[Candidate] = &[
    candidate(&["originPrice"], Expect::Number),
    candidate(&["originalPrice"], Expect::Number),
    candidate(&["listPrice"], Expect::Number),
];

const DISCOUNT_CANDIDATES: &[Candidate] = &[
    candidate(&["discountRate"], Expect::Number),
    candidate(&["discount"], Expect::Number),
];

const IMAGE_CANDIDATES: &[Candidate] = &[
    candidate(&["imageUrl"], Expect::Url),
    candidate(&["image"], Expect::Url),
    candidate(&["thumbnailUrl"], Expect::Url),
    candidate(&["mainImage"], Expect::Url),
    candidate(&["imageUrl"], Expect::NestedImage),
    candidate(&["image"], Expect::NestedImage),
    candidate(&["thumbnailUrl"], Expect::NestedImage),
    candidate(&["mainImage"], Expect::NestedImage),
    candidate(&["images"], Expect::ImageList),
    candidate(&["imageList"], Expect::ImageList),
    candidate(&["imageId"], Expect::ImageId),
    candidate(&["imageKey"], Expect::ImageId),
];

const ARTIST_CANDIDATES: &[Candidate] = &[
    candidate(&["artistName"], Expect::Text),
    candidate(&["artist", "name"], Expect::Text),
    candidate(&["sellerName"], Expect::Text),
];

const RATING_CANDIDATES: &[Candidate] = &[
    candidate(&["reviewAvg"], Expect::Number),
    candidate(&["rating"], Expect::Number),
    candidate(&["score"], Expect::Number),
];

const REVIEW_COUNT_CANDIDATES: &[Candidate] = &[
    candidate(&["reviewCount"], Expect::Number),
    candidate(&["reviewCnt"], Expect::Number),
];

const URL_CANDIDATES: &[Candidate] = &[
    candidate(&["url"], Expect::Url),
    candidate(&["productUrl"], Expect::Url),
    candidate(&["link"], Expect::Url),
];

const CATEGORY_CANDIDATES: &[Candidate] = &[
    candidate(&["categoryName"], Expect::Text),
    candidate(&["category"], Expect::Text),
    candidate(&["category", "name"], Expect::Text),
];

/// Value at a nested key path, or `None` if any hop is missing or not an object.
pub(crate) fn value_at<'a>(raw: &'a RawRecord, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = raw.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// The single "first match wins" lookup every field goes through.
pub(crate) fn first_match<T>(
    raw: &RawRecord,
    table: &[Candidate],
    mut accept: impl FnMut(&Value, Expect) -> Option<T>,
) -> Option<T> {
    table
        .iter()
        .find_map(|c| value_at(raw, c.path).and_then(|v| accept(v, c.expect)))
}

/// Looks up a string-valued field (text, identifier, or any URL form).
pub(crate) fn first_text(raw: &RawRecord, table: &[Candidate], site: &SiteConfig) -> Option<String> {
    first_match(raw, table, |value, expect| coerce_text(value, expect, site))
}

/// Looks up a numeric field.
pub(crate) fn first_number(raw: &RawRecord, table: &[Candidate]) -> Option<f64> {
    first_match(raw, table, |value, expect| match expect {
        Expect::Number => coerce_number(value),
        _ => None,
    })
}

fn coerce_text(value: &Value, expect: Expect, site: &SiteConfig) -> Option<String> {
    match expect {
        Expect::Text => non_blank(value),
        Expect::Identifier => identifier(value),
        Expect::Url => non_blank(value).map(|s| site.absolutize(&s)),
        Expect::NestedImage => nested_image(value, site),
        Expect::ImageList => value
            .as_array()?
            .first()
            .and_then(|first| {
                non_blank(first)
                    .map(|s| site.absolutize(&s))
                    .or_else(|| nested_image(first, site))
            }),
        Expect::ImageId => identifier(value).map(|id| site.image_url_from_id(&id)),
        Expect::Number => None,
    }
}

fn non_blank(value: &Value) -> Option<String> {
    let s = value.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => non_blank(value),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// `{"url": ...}` or `{"imageUrl": ...}` image objects.
pub(crate) fn nested_image(value: &Value, site: &SiteConfig) -> Option<String> {
    let obj = value.as_object()?;
    ["url", "imageUrl"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(non_blank))
        .map(|s| site.absolutize(&s))
}

/// Numbers, or numeric strings with thousands separators, spaces, or a
/// trailing `원`. Non-finite values are rejected.
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('원')
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Truncates toward zero; negatives become `0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn non_negative_int(n: f64) -> u64 {
    if n.is_finite() && n > 0.0 {
        n.trunc() as u64
    } else {
        0
    }
}

/// Like [`non_negative_int`], but zero and negative values mean "absent".
pub(crate) fn positive_int(n: f64) -> Option<u64> {
    let v = non_negative_int(n);
    (v > 0).then_some(v)
}

pub(crate) fn clamp_rating(n: f64) -> f64 {
    if n.is_finite() {
        n.clamp(0.0, MAX_RATING)
    } else {
        0.0
    }
}

fn discount_rate(n: f64) -> Option<u32> {
    positive_int(n).map(|v| u32::try_from(v).unwrap_or(u32::MAX).min(MAX_DISCOUNT_RATE))
}

/// Stable id for records that only carry a title: `product-<n>`, where `n`
/// comes from the SHA-256 of the title. Equal titles share an id.
#[must_use]
pub fn synthetic_id(title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let n = u64::from_be_bytes(prefix) % SYNTHETIC_ID_MODULUS;
    format!("product-{n}")
}

/// Normalizes a raw record into a [`Product`].
///
/// Returns `None` when the record has neither an identifier nor a title.
#[must_use]
pub fn normalize_product(raw: &RawRecord, site: &SiteConfig) -> Option<Product> {
    let native_id = first_text(raw, ID_CANDIDATES, site);
    let title = first_text(raw, TITLE_CANDIDATES, site);

    let id = match (native_id, &title) {
        (Some(id), _) => id,
        (None, Some(title)) => synthetic_id(title),
        (None, None) => return None,
    };

    let url = first_text(raw, URL_CANDIDATES, site).unwrap_or_else(|| site.product_url(&id));

    Some(Product {
        title: title.unwrap_or_else(|| TITLE_PLACEHOLDER.to_string()),
        price: first_number(raw, PRICE_CANDIDATES).map_or(0, non_negative_int),
        original_price: first_number(raw, ORIGINAL_PRICE_CANDIDATES).and_then(positive_int),
        discount_rate: first_number(raw, DISCOUNT_CANDIDATES).and_then(discount_rate),
        image: first_text(raw, IMAGE_CANDIDATES, site).unwrap_or_default(),
        artist_name: first_text(raw, ARTIST_CANDIDATES, site)
            .unwrap_or_else(|| ARTIST_PLACEHOLDER.to_string()),
        rating: first_number(raw, RATING_CANDIDATES).map_or(0.0, clamp_rating),
        review_count: first_number(raw, REVIEW_COUNT_CANDIDATES).map_or(0, non_negative_int),
        url,
        category: first_text(raw, CATEGORY_CANDIDATES, site),
        id,
    })
}

/// Normalizes a batch, dropping records that cannot be normalized.
#[must_use]
pub fn normalize_records(raws: &[RawRecord], site: &SiteConfig) -> Vec<Product> {
    let products: Vec<Product> = raws
        .iter()
        .filter_map(|raw| normalize_product(raw, site))
        .collect();
    let dropped = raws.len() - products.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = products.len(), "dropped records without id or title");
    }
    products
}

/// Keeps the JSON objects of an array, logging anything else.
pub(crate) fn objects_only(items: Vec<Value>) -> Vec<RawRecord> {
    let total = items.len();
    let records: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    if records.len() < total {
        tracing::debug!(
            skipped = total - records.len(),
            "ignored non-object entries in raw item array"
        );
    }
    records
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
