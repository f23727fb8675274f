//! Structured blocks embedded in rendered pages: framework bootstrap state
//! (`__NEXT_DATA__`, `__NUXT_DATA__`), schema.org JSON-LD products and
//! JSON-LD `ItemList` listings.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;

use crate::normalize::RawRecord;

static NEXT_DATA_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script#__NEXT_DATA__").expect("valid next data selector")
});
static NUXT_DATA_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script#__NUXT_DATA__").expect("valid nuxt data selector")
});
static LD_JSON_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid ld+json selector")
});

/// Serialized application state found in a page.
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapState {
    /// Next.js object graph rooted at `props`.
    NextData(Value),
    /// Nuxt flat payload: a top-level array of values.
    NuxtPayload(Vec<Value>),
    /// `Product` nodes listed by JSON-LD `ItemList` blocks.
    LinkedItemList(Vec<RawRecord>),
}

/// Every parseable bootstrap block: Next.js, then Nuxt, then JSON-LD item
/// lists.
#[must_use]
pub fn bootstrap_states(html: &str) -> Vec<BootstrapState> {
    let doc = Html::parse_document(html);
    let mut states = Vec::new();
    if let Some(value) = script_json(&doc, &NEXT_DATA_SEL, "__NEXT_DATA__") {
        states.push(BootstrapState::NextData(value));
    }
    if let Some(value) = script_json(&doc, &NUXT_DATA_SEL, "__NUXT_DATA__") {
        match value {
            Value::Array(items) => states.push(BootstrapState::NuxtPayload(items)),
            _ => tracing::debug!("__NUXT_DATA__ is not an array; ignoring"),
        }
    }
    let listed = item_list_products(&linked_data_nodes(&doc));
    if !listed.is_empty() {
        states.push(BootstrapState::LinkedItemList(listed));
    }
    states
}

/// The `__NEXT_DATA__` object graph, if present and parseable.
#[must_use]
pub fn next_data(html: &str) -> Option<Value> {
    let doc = Html::parse_document(html);
    script_json(&doc, &NEXT_DATA_SEL, "__NEXT_DATA__")
}

fn script_json(doc: &Html, selector: &Selector, label: &str) -> Option<Value> {
    let script = doc.select(selector).next()?;
    let text: String = script.text().collect();
    match serde_json::from_str(text.trim()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(block = label, error = %e, "bootstrap block is not valid JSON");
            None
        }
    }
}

/// JSON-LD nodes whose `@type` is or contains `Product`, in document order.
///
/// Each block may be a single object, an array of objects, or a container
/// with an `@graph` array; all three are searched.
#[must_use]
pub fn linked_data_products(html: &str) -> Vec<RawRecord> {
    let doc = Html::parse_document(html);
    linked_data_nodes(&doc)
        .into_iter()
        .filter_map(|node| match node {
            Value::Object(map) if is_type(map.get("@type"), "Product") => Some(map),
            _ => None,
        })
        .collect()
}

/// Top-level, array and `@graph` nodes of every parseable ld+json block.
fn linked_data_nodes(doc: &Html) -> Vec<Value> {
    let mut all = Vec::new();
    for script in doc.select(&LD_JSON_SEL) {
        let text: String = script.text().collect();
        let value: Value = match serde_json::from_str(text.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unparsable ld+json block");
                continue;
            }
        };

        let mut nodes: Vec<Value> = match value {
            Value::Array(items) => items,
            other => vec![other],
        };
        let graph: Vec<Value> = nodes
            .iter()
            .filter_map(|node| node.get("@graph").and_then(Value::as_array))
            .flatten()
            .cloned()
            .collect();
        nodes.extend(graph);
        all.extend(nodes);
    }
    all
}

/// `Product` entries of `ItemList` nodes. An element is either a `ListItem`
/// wrapping the product in `item` or the product itself.
fn item_list_products(nodes: &[Value]) -> Vec<RawRecord> {
    nodes
        .iter()
        .filter(|node| is_type(node.get("@type"), "ItemList"))
        .filter_map(|list| list.get("itemListElement").and_then(Value::as_array))
        .flatten()
        .filter_map(|element| {
            let candidate = element.get("item").unwrap_or(element);
            candidate
                .as_object()
                .filter(|obj| is_type(obj.get("@type"), "Product"))
                .cloned()
        })
        .collect()
}

/// `@type` may be a string or an array of strings.
fn is_type(type_node: Option<&Value>, expected: &str) -> bool {
    match type_node {
        Some(Value::String(s)) => s == expected,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(expected)),
        _ => false,
    }
}

/// Follows a key path through nested objects.
pub(crate) fn pointer<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}
