use super::*;

const URL: &str = "https://www.idus.com/w/product/9f1c-aa21";

fn site() -> SiteConfig {
    SiteConfig::new("https://www.idus.com", "https://image.idus.com/image/files")
}

fn next_page(state: &Value) -> String {
    format!(r#"<html><head><script id="__NEXT_DATA__">{state}</script></head><body></body></html>"#)
}

fn ld_page(blocks: &[Value]) -> String {
    let scripts: String = blocks
        .iter()
        .map(|b| format!(r#"<script type="application/ld+json">{b}</script>"#))
        .collect();
    format!("<html><head>{scripts}</head><body></body></html>")
}

// -----------------------------------------------------------------------
// DetailPayload::find
// -----------------------------------------------------------------------

#[test]
fn find_prefers_site_product_over_linked_data() {
    let mut html = next_page(&json!({ "props": { "pageProps": { "product": { "uuid": "p1" } } } }));
    html.push_str(&ld_page(&[json!({ "@type": "Product", "name": "LD" })]));
    assert!(matches!(DetailPayload::find(&html), Some(DetailPayload::SiteProduct(_))));
}

#[test]
fn find_reads_initial_data_product() {
    let html = next_page(&json!({ "props": { "pageProps": { "initialData": { "product": { "uuid": "p2" } } } } }));
    match DetailPayload::find(&html) {
        Some(DetailPayload::SiteProduct(raw)) => assert_eq!(raw.get("uuid"), Some(&json!("p2"))),
        other => panic!("expected site product, got {other:?}"),
    }
}

#[test]
fn find_falls_back_to_linked_data() {
    let html = ld_page(&[json!({ "@type": "WebPage" }), json!({ "@type": "Product", "name": "LD" })]);
    assert!(matches!(DetailPayload::find(&html), Some(DetailPayload::LinkedData(_))));
}

#[test]
fn find_none_without_structured_blocks() {
    assert_eq!(DetailPayload::find("<html><body><h1>상품</h1></body></html>"), None);
}

// -----------------------------------------------------------------------
// SiteProduct mapping
// -----------------------------------------------------------------------

#[test]
fn site_product_maps_detail_fields() {
    let raw = json!({
        "uuid": "9f1c-aa21",
        "name": "제주 현무암 트레이",
        "price": "32,000",
        "originPrice": 40000,
        "discountRate": 20,
        "artist": { "name": "돌공방" },
        "reviewAvg": 4.9,
        "reviewCount": 57,
        "description": "  손으로 다듬은 트레이  ",
        "images": ["//image.idus.com/t1.jpg", { "url": "/t2.jpg" }, 3],
        "options": [{ "name": "크기", "values": ["S", "L"] }],
        "tags": ["제주", { "name": "트레이" }, "제주", ""]
    });
    let detail = DetailPayload::SiteProduct(raw.as_object().unwrap().clone()).into_detail(URL, &site());
    assert_eq!(detail.product.id, "9f1c-aa21");
    assert_eq!(detail.product.price, 32_000);
    assert_eq!(detail.product.original_price, Some(40_000));
    assert_eq!(detail.product.artist_name, "돌공방");
    assert_eq!(detail.product.url, URL);
    assert_eq!(detail.product.image, "https://image.idus.com/t1.jpg");
    assert_eq!(detail.description.as_deref(), Some("손으로 다듬은 트레이"));
    assert_eq!(
        detail.additional_images,
        vec!["https://image.idus.com/t1.jpg", "https://www.idus.com/t2.jpg"]
    );
    assert_eq!(detail.options.len(), 1);
    assert_eq!(detail.tags, vec!["제주", "트레이", "제주"]);
}

#[test]
fn site_product_without_id_uses_url_segment() {
    let raw = json!({ "name": "무명 상품" });
    let detail = DetailPayload::SiteProduct(raw.as_object().unwrap().clone()).into_detail(URL, &site());
    assert_eq!(detail.product.id, "9f1c-aa21");
    assert_eq!(detail.product.title, "무명 상품");
}

// -----------------------------------------------------------------------
// LinkedData mapping
// -----------------------------------------------------------------------

#[test]
fn linked_data_maps_schema_org_product() {
    let raw = json!({
        "@type": "Product",
        "productID": "ld-77",
        "name": "라탄 바구니",
        "image": ["https://cdn.test/r1.jpg", "//cdn.test/r2.jpg"],
        "brand": { "@type": "Brand", "name": "엮음" },
        "offers": [{ "@type": "Offer", "price": "18000", "priceCurrency": "KRW" }],
        "aggregateRating": { "ratingValue": "4.7", "ratingCount": 12 },
        "description": "여름 바구니",
        "category": "리빙"
    });
    let detail = DetailPayload::LinkedData(raw.as_object().unwrap().clone()).into_detail(URL, &site());
    assert_eq!(detail.product.id, "ld-77");
    assert_eq!(detail.product.title, "라탄 바구니");
    assert_eq!(detail.product.price, 18_000);
    assert_eq!(detail.product.original_price, None);
    assert!((detail.product.rating - 4.7).abs() < f64::EPSILON);
    assert_eq!(detail.product.review_count, 12);
    assert_eq!(detail.product.artist_name, "엮음");
    assert_eq!(detail.product.image, "https://cdn.test/r1.jpg");
    assert_eq!(detail.additional_images.len(), 2);
    assert_eq!(detail.product.category.as_deref(), Some("리빙"));
    assert_eq!(detail.product.url, URL);
}

#[test]
fn linked_data_without_product_id_uses_url_segment() {
    let raw = json!({
        "@type": "Product",
        "name": "라탄 바구니",
        "image": "/single.jpg",
        "brand": "엮음",
        "offers": { "price": 9900 }
    });
    let detail = DetailPayload::LinkedData(raw.as_object().unwrap().clone()).into_detail(URL, &site());
    assert_eq!(detail.product.id, "9f1c-aa21");
    assert_eq!(detail.product.price, 9_900);
    assert_eq!(detail.product.image, "https://www.idus.com/single.jpg");
    assert!(detail.additional_images.is_empty());
    assert_eq!(detail.product.artist_name, "엮음");
}

// -----------------------------------------------------------------------
// placeholder
// -----------------------------------------------------------------------

#[test]
fn placeholder_detail_uses_sentinel_title() {
    let detail = placeholder_detail("https://www.idus.com/w/product/zz-9?from=home");
    assert_eq!(detail.product.id, "zz-9");
    assert_eq!(detail.product.title, UNAVAILABLE_TITLE);
    assert_eq!(detail.product.price, 0);
    assert_eq!(detail.product.url, "https://www.idus.com/w/product/zz-9?from=home");
}
