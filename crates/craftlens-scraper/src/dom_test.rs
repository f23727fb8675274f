use super::*;

fn site() -> SiteConfig {
    SiteConfig::new("https://www.idus.com", "https://image.idus.com/image/files")
}

fn str_field<'a>(record: &'a RawRecord, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

#[test]
fn resolve_reads_cards_and_dedupes_by_id() {
    let html = r#"<html><body><ul>
        <li><a href="/w/product/aaa-111?search=1"><img src="//image.idus.com/a.jpg">
            <span>흙과 불</span><span>달항아리 머그</span><span>10,000원</span><span>8,000원</span>
            <span>4.8 (120)</span><span>20%</span></a></li>
        <li><a href="/w/product/aaa-111">다시 같은 상품</a></li>
        <li><a href="https://www.idus.com/v2/product/bbb-222"><img data-src="/img/b.jpg" src="data:image/gif;base64,R0lG">
            작가B 원목 도마 23,000원</a></li>
        <li><a href="/about">회사 소개</a></li>
    </ul></body></html>"#;
    let records = resolve(html, 24, &site());
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(str_field(first, "id"), Some("aaa-111"));
    assert_eq!(str_field(first, "title"), Some("달항아리 머그"));
    assert_eq!(str_field(first, "artistName"), Some("흙과 불"));
    assert_eq!(first.get("price").and_then(Value::as_u64), Some(8_000));
    assert_eq!(first.get("originalPrice").and_then(Value::as_u64), Some(10_000));
    assert_eq!(first.get("discountRate").and_then(Value::as_u64), Some(20));
    assert_eq!(first.get("reviewCount").and_then(Value::as_u64), Some(120));
    assert_eq!(str_field(first, "image"), Some("https://image.idus.com/a.jpg"));
    assert_eq!(
        str_field(first, "url"),
        Some("https://www.idus.com/w/product/aaa-111?search=1")
    );

    let second = &records[1];
    assert_eq!(str_field(second, "id"), Some("bbb-222"));
    assert_eq!(str_field(second, "image"), Some("https://www.idus.com/img/b.jpg"));
    assert_eq!(str_field(second, "artistName"), Some("작가B"));
    assert_eq!(str_field(second, "title"), Some("원목 도마"));
}

#[test]
fn resolve_stops_at_size() {
    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/w/product/p{i}">작가<br>상품 {i}</a>"#))
        .collect();
    let html = format!("<html><body>{links}</body></html>");
    assert_eq!(resolve(&html, 4, &site()).len(), 4);
}

#[test]
fn resolve_page_without_product_links_is_empty() {
    let html = r#"<html><body><a href="/w/artist/x">작가 홈</a></body></html>"#;
    assert!(resolve(html, 24, &site()).is_empty());
}

#[test]
fn image_from_srcset() {
    let html = r#"<a href="/w/product/s1"><picture><source srcset="/s-1x.webp 1x, /s-2x.webp 2x"></picture>이름</a>"#;
    let records = resolve(html, 24, &site());
    assert_eq!(
        str_field(&records[0], "image"),
        Some("https://www.idus.com/s-1x.webp")
    );
}

#[test]
fn image_from_background_style() {
    let html = r#"<a href="/w/product/bg1"><div style="width:10px; background-image: url('//cdn.test/bg.png')"></div>이름</a>"#;
    let records = resolve(html, 24, &site());
    assert_eq!(str_field(&records[0], "image"), Some("https://cdn.test/bg.png"));
}

#[test]
fn image_from_ancestor_card() {
    let html = r#"<div class="card"><div class="thumb"><img src="/thumb/c1.jpg"></div>
        <div class="info"><a href="/w/product/c1">작가C<br>머그잔</a></div></div>"#;
    let records = resolve(html, 24, &site());
    assert_eq!(
        str_field(&records[0], "image"),
        Some("https://www.idus.com/thumb/c1.jpg")
    );
}

#[test]
fn imageless_card_does_not_borrow_neighbour_image() {
    let html = r#"<ul class="grid">
        <li><a href="/w/product/g1">작가G<br>이미지 없는 상품</a></li>
        <li><a href="/w/product/g2"><img src="/thumb/g2.jpg">작가H<br>접시</a></li>
    </ul>"#;
    let records = resolve(html, 24, &site());
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("image"), Some(&Value::Null));
    assert_eq!(
        str_field(&records[1], "image"),
        Some("https://www.idus.com/thumb/g2.jpg")
    );
}

#[test]
fn ancestor_walk_accepts_card_with_second_link_to_same_product() {
    let html = r#"<ul><li class="card">
        <div class="thumb"><img src="/thumb/d1.jpg"></div>
        <a href="/w/product/d1">작가D<br>컵받침</a>
        <a href="/w/product/d1#reviews">리뷰 보기</a>
    </li><li><a href="/w/product/d2">작가E<br>다른 상품</a></li></ul>"#;
    let records = resolve(html, 24, &site());
    assert_eq!(
        str_field(&records[0], "image"),
        Some("https://www.idus.com/thumb/d1.jpg")
    );
    assert_eq!(records[1].get("image"), Some(&Value::Null));
}

#[test]
fn link_without_image_has_null_image() {
    let html = r#"<a href="/w/product/n1">작가<br>이름</a>"#;
    let records = resolve(html, 24, &site());
    assert_eq!(records[0].get("image"), Some(&Value::Null));
}

#[test]
fn product_id_from_href_variants() {
    assert_eq!(product_id_from_href("/w/product/abc").as_deref(), Some("abc"));
    assert_eq!(
        product_id_from_href("https://www.idus.com/v2/product/xyz/reviews").as_deref(),
        Some("xyz")
    );
    assert_eq!(product_id_from_href("/w/products"), None);
}
