//! End-to-end tier fallback for `SearchPipeline`, with the API served by
//! `wiremock` and the rendered search page served by a scripted browser.

mod common;

use craftlens_core::{ResultSource, SearchParams};
use craftlens_scraper::{ApiResolver, ScraperError, SearchPipeline, SiteConfig};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{dom_only_search_page, sessions_for, test_timings, FakeLauncher, FakeState};

const SEARCH_PATH: &str = "/v2/www-api/search/review-unit";

async fn api_responding(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

fn pipeline(
    server: &MockServer,
    launcher: FakeLauncher,
) -> (SearchPipeline, std::sync::Arc<FakeState>) {
    let site = SiteConfig::new(&server.uri(), "https://image.idus.com/image/files");
    let api = ApiResolver::new(&site, 5, "craftlens-test/0.1").expect("failed to build ApiResolver");
    let (sessions, state) = sessions_for(launcher);
    (SearchPipeline::new(api, sessions, site, test_timings()), state)
}

fn next_data_page(products: &serde_json::Value) -> String {
    format!(
        r#"<html><head><script id="__NEXT_DATA__" type="application/json">{}</script></head><body></body></html>"#,
        json!({ "props": { "pageProps": { "dehydratedState": { "queries": [
            { "state": { "data": { "products": products } } }
        ] } } } })
    )
}

// ---------------------------------------------------------------------------
// api tier
// ---------------------------------------------------------------------------

#[tokio::test]
async fn api_products_are_returned_without_launching_a_browser() {
    let server = api_responding(ResponseTemplate::new(200).set_body_json(json!({
        "products": [
            { "uuid": "u1", "name": "머그", "price": 9000, "artistName": "흙" },
            { "uuid": "u2", "name": "접시", "price": "12,000" },
            { "price": 100 }
        ]
    })))
    .await;
    let (pipeline, state) = pipeline(&server, FakeLauncher::serving(Vec::new()));

    let mut params = SearchParams::new("  머그컵 ");
    params.size = 3;
    let result = pipeline.search(params).await.unwrap();

    assert_eq!(result.source, Some(ResultSource::Api));
    assert_eq!(result.keyword, "머그컵");
    assert_eq!(result.total, 2);
    assert!(result.has_more, "3 raw records with size 3 means more pages");
    assert_eq!(result.products[1].price, 12_000);
    assert_eq!(state.launches(), 0);
}

// ---------------------------------------------------------------------------
// page-state tier
// ---------------------------------------------------------------------------

#[tokio::test]
async fn api_failure_falls_back_to_page_state() {
    let server = api_responding(ResponseTemplate::new(503)).await;
    let page = next_data_page(&json!([
        { "id": "n1", "name": "캔들", "price": 15000 },
        { "id": "n2", "name": "디퓨저", "price": 22000 }
    ]));
    let (pipeline, state) = pipeline(&server, FakeLauncher::serving(vec![("/v2/search", page)]));

    let result = pipeline.search(SearchParams::new("캔들")).await.unwrap();

    assert_eq!(result.source, Some(ResultSource::PageState));
    assert_eq!(result.total, 2);
    assert!(!result.has_more);
    assert_eq!(state.contexts_opened(), 1);
    assert_eq!(state.contexts_closed(), 1);
}

#[tokio::test]
async fn linked_data_item_list_is_used_before_dom_links() {
    let server = api_responding(ResponseTemplate::new(503)).await;
    let item_list = json!({
        "@context": "https://schema.org",
        "@type": "ItemList",
        "itemListElement": [
            { "@type": "ListItem", "position": 1, "item": {
                "@type": "Product", "sku": "ld-7", "name": "라탄 바구니",
                "offers": { "price": "18000" }
            } }
        ]
    });
    let page = format!(
        r#"<html><head><script type="application/ld+json">{item_list}</script></head>
        <body><a href="/w/product/dom-1">작가<br>링크 상품</a></body></html>"#
    );
    let (pipeline, _state) = pipeline(&server, FakeLauncher::serving(vec![("/v2/search", page)]));

    let result = pipeline.search(SearchParams::new("바구니")).await.unwrap();

    assert_eq!(result.source, Some(ResultSource::PageState));
    assert_eq!(result.products.len(), 1);
    assert_eq!(result.products[0].id, "ld-7");
    assert_eq!(result.products[0].price, 18_000);
}

// ---------------------------------------------------------------------------
// dom tier
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_api_and_no_bootstrap_fall_back_to_dom_links() {
    let server =
        api_responding(ResponseTemplate::new(200).set_body_json(json!({ "products": [] }))).await;
    let (pipeline, state) = pipeline(
        &server,
        FakeLauncher::serving(vec![("/v2/search", dom_only_search_page(5))]),
    );

    let result = pipeline.search(SearchParams::new("수제")).await.unwrap();

    assert_eq!(result.source, Some(ResultSource::Dom));
    assert_eq!(result.products.len(), 5);
    assert_eq!(result.total, 5);
    assert!(!result.has_more);

    let first = &result.products[0];
    assert_eq!(first.id, "dom-1");
    assert_eq!(first.title, "수제 상품 1");
    assert_eq!(first.artist_name, "작가1");
    assert_eq!(first.price, 11_000);
    assert_eq!(first.image, "https://image.idus.com/dom-1.jpg");
    assert!(first.url.ends_with("/w/product/dom-1"));

    // the page is rendered once and shared by both browser tiers
    assert_eq!(state.navigations(), 1);
    assert_eq!(state.contexts_closed(), state.contexts_opened());
}

#[tokio::test]
async fn exhausted_tiers_return_empty_result() {
    let server = api_responding(ResponseTemplate::new(500)).await;
    let page = "<html><body><p>검색 결과가 없습니다</p></body></html>".to_owned();
    let (pipeline, _state) = pipeline(&server, FakeLauncher::serving(vec![("/v2/search", page)]));

    let result = pipeline.search(SearchParams::new("없는상품")).await.unwrap();

    assert!(result.products.is_empty());
    assert_eq!(result.total, 0);
    assert!(!result.has_more);
    assert_eq!(result.source, None);
}

// ---------------------------------------------------------------------------
// errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn api_failure_without_browser_is_rendering_unavailable() {
    let server = api_responding(ResponseTemplate::new(500)).await;
    let (pipeline, state) = pipeline(&server, FakeLauncher::failing());

    let result = pipeline.search(SearchParams::new("지갑")).await;

    assert!(
        matches!(result, Err(ScraperError::RenderingUnavailable { .. })),
        "expected RenderingUnavailable, got: {result:?}"
    );
    assert_eq!(state.launches(), 1);
}

#[tokio::test]
async fn navigation_failure_is_rendering_unavailable_and_releases_context() {
    let server = api_responding(ResponseTemplate::new(500)).await;
    let (pipeline, state) = pipeline(&server, FakeLauncher::serving(Vec::new()));

    let result = pipeline.search(SearchParams::new("지갑")).await;

    assert!(matches!(result, Err(ScraperError::RenderingUnavailable { .. })));
    assert_eq!(state.contexts_opened(), 1);
    assert_eq!(state.contexts_closed(), 1);
}

#[tokio::test]
async fn blank_keyword_is_rejected_before_any_tier_runs() {
    let server = MockServer::start().await;
    let (pipeline, state) = pipeline(&server, FakeLauncher::serving(Vec::new()));

    let result = pipeline.search(SearchParams::new("   ")).await;

    assert!(matches!(result, Err(ScraperError::InvalidParams(_))));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    assert_eq!(state.launches(), 0);
}
