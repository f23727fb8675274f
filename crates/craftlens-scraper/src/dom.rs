//! DOM tier: product links in the rendered document, read through
//! [`crate::heuristics`].

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Value};

use crate::heuristics::parse_card_text;
use crate::normalize::RawRecord;
use crate::site::SiteConfig;

/// How far up from a link to look for a product image.
const MAX_ANCESTOR_DEPTH: usize = 3;

const LAZY_SRC_ATTRS: &[&str] = &["data-src", "data-lazy-src", "data-original", "data-lazy"];

static PRODUCT_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:w|v2)/product/([^/?#\s]+)").expect("valid product href regex")
});
static BACKGROUND_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)background(?:-image)?\s*:[^;]*url\(\s*['"]?([^'")]+?)['"]?\s*\)"#)
        .expect("valid background url regex")
});

static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid link selector"));
static IMG_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid img selector"));
static SRCSET_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[srcset], [data-srcset]").expect("valid srcset selector")
});
static STYLED_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[style]").expect("valid style selector"));

/// Builds up to `size` raw records from product links in `html`.
///
/// Links are deduplicated by product id, first occurrence wins. Never fails;
/// a page with no product links yields an empty list.
#[must_use]
pub fn resolve(html: &str, size: usize, site: &SiteConfig) -> Vec<RawRecord> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for link in doc.select(&LINK_SEL) {
        if records.len() >= size {
            break;
        }
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(id) = product_id_from_href(href) else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }

        let image = image_for_link(link, &id).map(|src| site.absolutize(&src));
        records.push(card_record(&id, &site.absolutize(href), image, &link_text(link), records.len()));
    }

    tracing::debug!(count = records.len(), "dom tier collected product links");
    records
}

/// Product id from an `href` such as `/w/product/abc?x=1`.
#[must_use]
pub fn product_id_from_href(href: &str) -> Option<String> {
    PRODUCT_HREF_RE
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Text nodes under the link, trimmed, one per line.
fn link_text(link: ElementRef<'_>) -> String {
    link.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn card_record(
    id: &str,
    url: &str,
    image: Option<String>,
    text: &str,
    position: usize,
) -> RawRecord {
    let card = parse_card_text(text, position);
    let mut record = RawRecord::new();
    record.insert("id".into(), json!(id));
    record.insert("title".into(), json!(card.title));
    record.insert("price".into(), json!(card.price));
    if let Some(original) = card.original_price {
        record.insert("originalPrice".into(), json!(original));
    }
    if let Some(rate) = card.discount_rate {
        record.insert("discountRate".into(), json!(rate));
    }
    if let Some(artist) = card.artist_name {
        record.insert("artistName".into(), json!(artist));
    }
    record.insert("image".into(), image.map_or(Value::Null, Value::String));
    record.insert("rating".into(), json!(card.rating));
    record.insert("reviewCount".into(), json!(card.review_count));
    record.insert("url".into(), json!(url));
    record
}

/// Image for a link: inside the link first, then up to three ancestors.
///
/// The walk stops at the first ancestor that also holds a link to another
/// product, so a card never borrows a neighbour's image.
fn image_for_link(link: ElementRef<'_>, id: &str) -> Option<String> {
    image_within(link).or_else(|| {
        link.ancestors()
            .filter_map(ElementRef::wrap)
            .take(MAX_ANCESTOR_DEPTH)
            .take_while(|ancestor| !links_other_product(*ancestor, id))
            .find_map(image_within)
    })
}

fn links_other_product(el: ElementRef<'_>, id: &str) -> bool {
    el.select(&LINK_SEL).any(|a| {
        a.value()
            .attr("href")
            .and_then(product_id_from_href)
            .is_some_and(|other| other != id)
    })
}

fn image_within(el: ElementRef<'_>) -> Option<String> {
    let imgs: Vec<ElementRef<'_>> = el.select(&IMG_SEL).collect();

    imgs.iter()
        .find_map(|img| usable_src(img.value().attr("src")))
        .or_else(|| {
            imgs.iter().find_map(|img| {
                LAZY_SRC_ATTRS
                    .iter()
                    .find_map(|attr| usable_src(img.value().attr(attr)))
            })
        })
        .or_else(|| {
            el.select(&SRCSET_SEL).find_map(|node| {
                let value = node.value();
                first_srcset_candidate(value.attr("srcset"))
                    .or_else(|| first_srcset_candidate(value.attr("data-srcset")))
            })
        })
        .or_else(|| {
            std::iter::once(el)
                .chain(el.select(&STYLED_SEL))
                .find_map(|node| background_url(node.value().attr("style")))
        })
}

/// Non-empty and not an inline `data:` placeholder.
fn usable_src(src: Option<&str>) -> Option<String> {
    let src = src?.trim();
    (!src.is_empty() && !src.starts_with("data:")).then(|| src.to_string())
}

/// `a.jpg 1x, b.jpg 2x` → `a.jpg`.
fn first_srcset_candidate(srcset: Option<&str>) -> Option<String> {
    let first = srcset?.split(',').next()?.split_whitespace().next()?;
    usable_src(Some(first))
}

fn background_url(style: Option<&str>) -> Option<String> {
    let caps = BACKGROUND_URL_RE.captures(style?)?;
    usable_src(caps.get(1).map(|m| m.as_str()))
}

#[cfg(test)]
#[path = "dom_test.rs"]
mod tests;
