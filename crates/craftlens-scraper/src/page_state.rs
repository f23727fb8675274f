//! Page-state tier: product arrays inside the rendered page's bootstrap
//! state, or products listed by JSON-LD `ItemList` blocks.

use std::collections::HashSet;

use serde_json::{json, Value};

use crate::bootstrap::{bootstrap_states, pointer, BootstrapState};
use crate::error::ScraperError;
use crate::normalize::{normalize_product, objects_only, RawRecord};
use crate::pipeline::Tier;
use crate::site::{last_path_segment, SiteConfig};

const PAGE_PROPS: &[&str] = &["props", "pageProps"];
const QUERIES: &[&str] = &["props", "pageProps", "dehydratedState", "queries"];
const PAGE_PROPS_SLOTS: &[&str] = &["products", "initialData", "searchResult"];

const ID_KEYS: &[&str] = &["uuid", "id", "productId", "productUuid"];
const NAME_KEYS: &[&str] = &["name", "title", "productName"];
const PRICE_KEYS: &[&str] = &["price", "salePrice", "sellingPrice"];

/// Extracts up to `size` raw product records from the page's bootstrap
/// blocks.
///
/// A candidate array only counts when at least one of its records
/// normalizes; otherwise the next chain or block is tried.
///
/// # Errors
///
/// Returns [`ScraperError::TierUnavailable`] when the page has no bootstrap
/// block or none of them holds usable product records.
pub fn resolve(html: &str, size: usize, site: &SiteConfig) -> Result<Vec<RawRecord>, ScraperError> {
    let states = bootstrap_states(html);
    if states.is_empty() {
        return Err(ScraperError::unavailable(Tier::PageState, "no bootstrap state block in page"));
    }

    let usable = |records: &[RawRecord]| records.iter().any(|r| normalize_product(r, site).is_some());

    for state in &states {
        let records = match state {
            BootstrapState::NextData(root) => from_next_data(root, size, &usable),
            BootstrapState::NuxtPayload(items) => from_nuxt_payload(items, size),
            BootstrapState::LinkedItemList(items) => from_item_list(items, size),
        };
        if usable(&records) {
            return Ok(records);
        }
        tracing::debug!(raw = records.len(), "bootstrap block yielded no usable products");
    }

    Err(ScraperError::unavailable(
        Tier::PageState,
        "bootstrap state holds no product array",
    ))
}

/// Walks the Next.js chains in priority order; the first chain whose
/// records pass `usable` wins.
pub(crate) fn from_next_data(
    root: &Value,
    size: usize,
    usable: &dyn Fn(&[RawRecord]) -> bool,
) -> Vec<RawRecord> {
    let queries: &[Value] = pointer(root, QUERIES)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    // queries[*].state.data.products
    for query in queries {
        if let Some(products) = pointer(query, &["state", "data", "products"]).and_then(Value::as_array) {
            let records = take_objects(products, size);
            if usable(&records) {
                return records;
            }
        }
    }

    // queries[*].state.data.pages[*].products
    let mut paged = Vec::new();
    'queries: for query in queries {
        let Some(pages) = pointer(query, &["state", "data", "pages"]).and_then(Value::as_array)
        else {
            continue;
        };
        for page in pages {
            let Some(products) = page.get("products").and_then(Value::as_array) else {
                continue;
            };
            paged.extend(products.iter().filter(|p| p.is_object()).cloned());
            if paged.len() >= size {
                break 'queries;
            }
        }
    }
    paged.truncate(size);
    let paged = objects_only(paged);
    if usable(&paged) {
        return paged;
    }

    // props.pageProps.{products,initialData,searchResult}
    let Some(page_props) = pointer(root, PAGE_PROPS) else {
        return Vec::new();
    };
    PAGE_PROPS_SLOTS
        .iter()
        .filter_map(|slot| page_props.get(*slot))
        .filter_map(|slot| match slot {
            Value::Array(items) => Some(items),
            Value::Object(obj) => obj.get("products").and_then(Value::as_array),
            _ => None,
        })
        .map(|items| take_objects(items, size))
        .find(|records| usable(records))
        .unwrap_or_default()
}

fn take_objects(items: &[Value], size: usize) -> Vec<RawRecord> {
    objects_only(items.iter().filter(|v| v.is_object()).take(size).cloned().collect())
}

/// Maps schema.org `Product` nodes onto the keys the normalizer reads.
pub(crate) fn from_item_list(items: &[RawRecord], size: usize) -> Vec<RawRecord> {
    items.iter().take(size).map(item_list_record).collect()
}

fn item_list_record(product: &RawRecord) -> RawRecord {
    let mut record = RawRecord::new();

    let url = product.get("url").and_then(Value::as_str);
    let id = ["sku", "productID"]
        .iter()
        .find_map(|key| identifier(product.get(*key)))
        .or_else(|| url.and_then(last_path_segment));
    if let Some(id) = id {
        record.insert("id".into(), json!(id));
    }
    if let Some(name) = product.get("name") {
        record.insert("title".into(), name.clone());
    }

    let offer = match product.get("offers") {
        Some(Value::Array(offers)) => offers.first(),
        other => other,
    };
    if let Some(price) = offer.and_then(|o| o.get("price")) {
        record.insert("price".into(), price.clone());
    }

    if let Some(rating) = product.get("aggregateRating") {
        if let Some(value) = rating.get("ratingValue") {
            record.insert("rating".into(), value.clone());
        }
        if let Some(count) = rating.get("reviewCount").or_else(|| rating.get("ratingCount")) {
            record.insert("reviewCount".into(), count.clone());
        }
    }

    let image = match product.get("image") {
        Some(Value::Array(images)) => images.first(),
        other => other,
    };
    if let Some(image) = image {
        record.insert("image".into(), image.clone());
    }

    let brand = match product.get("brand") {
        Some(Value::Object(brand)) => brand.get("name"),
        other => other,
    };
    if let Some(Value::String(brand)) = brand {
        record.insert("artistName".into(), json!(brand));
    }

    if let Some(url) = url {
        record.insert("url".into(), json!(url));
    }
    record
}

fn identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Scans a flat Nuxt payload one level deep for product-shaped objects.
///
/// Values in the payload are often indices into the same array; they are
/// not dereferenced, only key presence is checked.
pub(crate) fn from_nuxt_payload(items: &[Value], size: usize) -> Vec<RawRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for candidate in flatten_one_level(items) {
        if records.len() >= size {
            break;
        }
        if !looks_like_product(candidate) {
            continue;
        }
        let Some(key) = identifier_key(candidate) else {
            continue;
        };
        if seen.insert(key) {
            records.push(candidate.clone());
        }
    }

    records
}

fn flatten_one_level(items: &[Value]) -> Vec<&RawRecord> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Value::Object(obj) => {
                out.push(obj);
                for nested in ["products", "items"] {
                    if let Some(arr) = obj.get(nested).and_then(Value::as_array) {
                        out.extend(arr.iter().filter_map(Value::as_object));
                    }
                }
            }
            Value::Array(arr) => out.extend(arr.iter().filter_map(Value::as_object)),
            _ => {}
        }
    }
    out
}

fn looks_like_product(obj: &RawRecord) -> bool {
    let has_any = |keys: &[&str]| keys.iter().any(|k| obj.contains_key(*k));
    has_any(ID_KEYS) && has_any(NAME_KEYS) && has_any(PRICE_KEYS)
}

fn identifier_key(obj: &RawRecord) -> Option<String> {
    ID_KEYS.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

#[cfg(test)]
#[path = "page_state_test.rs"]
mod tests;
