//! Regex heuristics over the visible text of one rendered product card.
//!
//! Cards on the search page render as loose text: artist, title, one or two
//! won amounts, a `4.8 (120)` rating/review pair and a discount badge. None of
//! it is labelled, so every field is recovered by pattern.

use std::sync::LazyLock;

use regex::Regex;

/// Cards whose first line is at most this many characters (and has no price)
/// are treated as "artist on line one, title below".
const ARTIST_LINE_MAX_CHARS: usize = 20;

/// Shortest line accepted as a title in the multi-line layout.
const TITLE_MIN_CHARS: usize = 3;

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3}(?:,\d{3})+|\d+)\s*원").expect("valid price regex")
});
static PRICE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)\s*원$").expect("valid price line regex")
});
static RATING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d(?:\.\d)?)\s*\((\d[\d,]*)\)").expect("valid rating regex")
});
static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3})\s*%").expect("valid percent regex"));
static PERCENT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}\s*%$").expect("valid percent line regex"));
static PROMO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"무료배송|쿠폰|특가|할인|\b(?:BEST|NEW|HOT)\b").expect("valid promo regex")
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Everything recoverable from one card's text.
#[derive(Debug, Clone, PartialEq)]
pub struct CardText {
    pub title: String,
    pub artist_name: Option<String>,
    pub price: u64,
    pub original_price: Option<u64>,
    pub discount_rate: Option<u32>,
    pub rating: f64,
    pub review_count: u64,
}

/// Parses a card's text. `position` is the card's zero-based index on the
/// page and only feeds the `상품 {n}` title placeholder.
#[must_use]
pub fn parse_card_text(text: &str, position: usize) -> CardText {
    let (price, original_price) = split_prices(&extract_prices(text));
    let (rating, review_count) = extract_rating(text).unwrap_or((0.0, 0));
    let (artist_name, raw_title) = split_artist_title(text);

    let title = raw_title
        .map(|t| clean_title(&t))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("상품 {}", position + 1));

    CardText {
        title,
        artist_name,
        price,
        original_price,
        discount_rate: extract_discount(text),
        rating,
        review_count,
    }
}

/// All won amounts in document order, e.g. `10,000원` → `10000`.
#[must_use]
pub fn extract_prices(text: &str) -> Vec<u64> {
    PRICE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().replace(',', "").parse().ok())
        .collect()
}

/// Two or more prices read as original then sale; one is the sale price.
fn split_prices(prices: &[u64]) -> (u64, Option<u64>) {
    match prices {
        [] => (0, None),
        [only] => (*only, None),
        [original, sale, ..] => (*sale, Some(*original)),
    }
}

/// First `4.8 (120)` pair as `(rating, review count)`.
#[must_use]
pub fn extract_rating(text: &str) -> Option<(f64, u64)> {
    let caps = RATING_RE.captures(text)?;
    let rating = caps.get(1)?.as_str().parse().ok()?;
    let count = caps.get(2)?.as_str().replace(',', "").parse().ok()?;
    Some((rating, count))
}

/// First standalone `NN%` token.
#[must_use]
pub fn extract_discount(text: &str) -> Option<u32> {
    PERCENT_RE
        .captures(text)
        .and_then(|caps| caps.get(1)?.as_str().parse().ok())
}

/// Splits card text into `(artist, title)` before noise stripping.
///
/// A short first line with no price is the artist, and the title is the
/// next line that is neither a bare price nor a bare percentage. Otherwise
/// the first line's first word is the artist and the rest is the title.
#[must_use]
pub fn split_artist_title(text: &str) -> (Option<String>, Option<String>) {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let Some((first, rest)) = lines.split_first() else {
        return (None, None);
    };

    if !PRICE_RE.is_match(first) && first.chars().count() <= ARTIST_LINE_MAX_CHARS {
        let title = rest
            .iter()
            .find(|line| {
                !PRICE_LINE_RE.is_match(line)
                    && !PERCENT_LINE_RE.is_match(line)
                    && line.chars().count() >= TITLE_MIN_CHARS
            })
            .map(|line| (*line).to_string());
        return (Some((*first).to_string()), title);
    }

    let mut words = first.splitn(2, char::is_whitespace);
    let artist = words.next().map(str::to_string);
    let title = words
        .next()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    (artist, title)
}

/// Removes prices, rating pairs, percentages and promotional badges.
#[must_use]
pub fn clean_title(raw: &str) -> String {
    let stripped = PRICE_RE.replace_all(raw, " ");
    let stripped = RATING_RE.replace_all(&stripped, " ");
    let stripped = PERCENT_RE.replace_all(&stripped, " ");
    let stripped = PROMO_RE.replace_all(&stripped, " ");
    WHITESPACE_RE.replace_all(stripped.trim(), " ").into_owned()
}

#[cfg(test)]
#[path = "heuristics_test.rs"]
mod tests;
