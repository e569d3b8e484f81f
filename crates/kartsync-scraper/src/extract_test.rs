use super::*;
use crate::selectors::{FieldSelector, SelectorSet};

const BASE: &str = "https://shop.example.com/en/brakes/";

fn default_selectors() -> CompiledSelectors {
    SelectorSet::storefront_default().compile().unwrap()
}

fn tile(inner: &str) -> String {
    format!(r#"<article class="product-miniature">{inner}</article>"#)
}

fn page(tiles: &[String]) -> String {
    format!("<html><body><div id=\"products\">{}</div></body></html>", tiles.join("\n"))
}

#[test]
fn extracts_full_tile() {
    let html = page(&[tile(
        r#"<a class="thumbnail" href="/en/brakes/crg-pad-set.html">
             <img data-src="/img/p/crg-pad.jpg" src="/img/loading.gif" alt="CRG pads">
           </a>
           <h2 class="product-title"><a href="/en/brakes/crg-pad-set.html">CRG  Brake Pad
             Set</a></h2>
           <div class="product-price-and-shipping">
             <span class="regular-price">10 990 Ft</span>
             <span class="price">8 990 Ft</span>
           </div>
           <span class="product-brand">CRG</span>"#,
    )]);

    let extraction = extract_candidates(&html, &default_selectors(), BASE);
    assert_eq!(extraction.skipped, 0);
    assert_eq!(extraction.flagged, 0);
    let c = &extraction.candidates[0];
    assert_eq!(c.name, "CRG Brake Pad Set");
    assert_eq!(c.slug, "crg-brake-pad-set");
    assert_eq!(c.price, "8990");
    assert_eq!(c.original_price.as_deref(), Some("10990"));
    assert_eq!(
        c.image_url.as_deref(),
        Some("https://shop.example.com/img/p/crg-pad.jpg")
    );
    assert_eq!(
        c.url.as_deref(),
        Some("https://shop.example.com/en/brakes/crg-pad-set.html")
    );
    assert_eq!(c.brand.as_deref(), Some("CRG"));
    assert!(!c.flagged);
}

#[test]
fn name_falls_back_to_link_title_then_image_alt() {
    let html = page(&[
        tile(
            r#"<h2 class="product-title"><a href="/a.html" title="Rotax Max Piston"></a></h2>
               <span class="price">45 000 Ft</span>"#,
        ),
        tile(
            r#"<img src="/img/chain.jpg" alt="Chain 219 106L">
               <span class="price">4 500 Ft</span>"#,
        ),
    ]);
    let extraction = extract_candidates(&html, &default_selectors(), BASE);
    let names: Vec<&str> = extraction.candidates.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Rotax Max Piston", "Chain 219 106L"]);
}

#[test]
fn tile_without_name_is_skipped_and_counted() {
    let html = page(&[
        tile(r#"<span class="price">1 000 Ft</span>"#),
        tile(r#"<h2 class="product-title">Sprocket Z10</h2><span class="price">2 000 Ft</span>"#),
    ]);
    let extraction = extract_candidates(&html, &default_selectors(), BASE);
    assert_eq!(extraction.skipped, 1);
    assert_eq!(extraction.candidates.len(), 1);
    assert_eq!(extraction.candidates[0].name, "Sprocket Z10");
}

#[test]
fn zero_price_is_flagged_not_dropped() {
    let html = page(&[tile(
        r#"<h2 class="product-title">Seat Strut</h2><span class="price">0 Ft</span>"#,
    )]);
    let extraction = extract_candidates(&html, &default_selectors(), BASE);
    assert_eq!(extraction.flagged, 1);
    assert_eq!(extraction.candidates.len(), 1);
    assert!(extraction.candidates[0].flagged);
    assert!(extraction.candidates[0].price.is_empty());
}

#[test]
fn original_price_not_above_price_is_dropped() {
    let html = page(&[tile(
        r#"<h2 class="product-title">Axle 50mm</h2>
           <span class="regular-price">30 000 Ft</span>
           <span class="price">30 000 Ft</span>"#,
    )]);
    let extraction = extract_candidates(&html, &default_selectors(), BASE);
    assert!(extraction.candidates[0].original_price.is_none());
}

#[test]
fn custom_selector_set() {
    let set = SelectorSet {
        item: "li.product".to_owned(),
        name: vec![FieldSelector::text("h3")],
        price: vec![FieldSelector::attr("span[data-price]", "data-price")],
        original_price: vec![],
        image: vec![],
        link: vec![],
        brand: vec![],
        next_page: vec![],
    };
    let html = r#"<ul><li class="product"><h3>Fuel Tank 8L</h3><span data-price="12.50">12,50 EUR</span></li></ul>"#;
    let extraction = extract_candidates(html, &set.compile().unwrap(), BASE);
    assert_eq!(extraction.candidates[0].price, "12.5");
    assert!(extraction.candidates[0].image_url.is_none());
}

#[test]
fn next_page_link_is_resolved() {
    let html = r#"<html><body><nav class="pagination"><a rel="next" href="?page=2">Next</a></nav></body></html>"#;
    assert_eq!(
        next_page_url(html, &default_selectors(), BASE).as_deref(),
        Some("https://shop.example.com/en/brakes/?page=2")
    );
}

#[test]
fn last_page_has_no_next_link() {
    let html = "<html><body><nav class=\"pagination\"></nav></body></html>";
    assert!(next_page_url(html, &default_selectors(), BASE).is_none());
}

#[test]
fn absorb_sums_counters() {
    let mut total = Extraction::default();
    total.absorb(Extraction {
        candidates: vec![ScrapedCandidate::new("A", "1")],
        skipped: 2,
        flagged: 1,
    });
    total.absorb(Extraction {
        candidates: vec![ScrapedCandidate::new("B", "2")],
        skipped: 0,
        flagged: 3,
    });
    assert_eq!(total.candidates.len(), 2);
    assert_eq!(total.skipped, 2);
    assert_eq!(total.flagged, 4);
}
