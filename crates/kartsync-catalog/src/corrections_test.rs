use super::*;
use crate::fixtures::{catalog, record};

#[test]
fn reassign_moves_matching_records() {
    let mut cat = catalog(vec![
        record("1", "mychron-5", "AiM MyChron 5"),
        record("2", "crg-pad", "CRG Pad"),
        record("3", "mychron-6", "MYCHRON 6"),
    ]);

    let changed = reassign_category(&mut cat, "mychron", "electronics", Some("data-loggers")).unwrap();

    assert_eq!(changed, 2);
    assert_eq!(cat.products[0].category, "electronics");
    assert_eq!(cat.products[0].subcategory.as_deref(), Some("data-loggers"));
    assert_eq!(cat.products[1].category, "brakes");
    assert_eq!(cat.products[2].category, "electronics");
}

#[test]
fn reassign_twice_changes_nothing_second_time() {
    let mut cat = catalog(vec![record("1", "p", "Rotax Piston")]);
    assert_eq!(reassign_category(&mut cat, "piston", "engine", None).unwrap(), 1);
    assert_eq!(reassign_category(&mut cat, "piston", "engine", None).unwrap(), 0);
}

#[test]
fn invalid_pattern_is_reported() {
    let mut cat = catalog(vec![]);
    let err = reassign_category(&mut cat, "(unclosed", "x", None).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
}

#[test]
fn correct_price_sets_promotion() {
    let mut cat = catalog(vec![record("mk-1", "pad", "Pad")]);

    assert_eq!(correct_price(&mut cat, "mk-1", "8990.00", Some("10990")).unwrap(), 1);

    let r = &cat.products[0];
    assert_eq!(r.price, "8990");
    assert_eq!(r.discounted_price.as_deref(), Some("8990"));
    assert_eq!(r.original_price.as_deref(), Some("10990"));
}

#[test]
fn correct_price_without_original_clears_promotion() {
    let mut base = record("mk-1", "pad", "Pad");
    base.discounted_price = Some("800".to_owned());
    base.original_price = Some("1000".to_owned());
    let mut cat = catalog(vec![base]);

    correct_price(&mut cat, "mk-1", "950", None).unwrap();

    assert_eq!(cat.products[0].price, "950");
    assert!(cat.products[0].discounted_price.is_none());
    assert!(cat.products[0].original_price.is_none());
}

#[test]
fn correct_price_rejects_bad_values() {
    let mut cat = catalog(vec![record("mk-1", "pad", "Pad")]);
    assert!(matches!(
        correct_price(&mut cat, "mk-1", "0", None),
        Err(CatalogError::InvalidPrice { .. })
    ));
    assert!(matches!(
        correct_price(&mut cat, "mk-1", "twelve", None),
        Err(CatalogError::InvalidPrice { .. })
    ));
    assert!(matches!(
        correct_price(&mut cat, "mk-1", "100", Some("90")),
        Err(CatalogError::InvalidPrice { .. })
    ));
    assert!(matches!(
        correct_price(&mut cat, "nope", "100", None),
        Err(CatalogError::NotFound { .. })
    ));
    assert_eq!(cat.products[0].price, "1000");
}

#[test]
fn clean_text_strips_markup_and_entities() {
    let mut dirty = record("1", "pad", "CRG&nbsp;Brake  Pad &amp; Clip");
    dirty.description = "<p>Fits <b>KZ</b>&nbsp;and&nbsp;OK</p>\n<br/>Made in Italy &quot;2024&quot;".to_owned();
    let mut cat = catalog(vec![dirty, record("2", "disc", "Disc")]);

    assert_eq!(clean_text(&mut cat), 1);
    assert_eq!(cat.products[0].name, "CRG Brake Pad & Clip");
    assert_eq!(
        cat.products[0].description,
        "Fits KZ and OK Made in Italy \"2024\""
    );
    assert_eq!(clean_text(&mut cat), 0);
}

#[test]
fn clean_text_keeps_text_after_unclosed_angle_bracket() {
    let mut cat = catalog(vec![record("1", "spacer", "Spacer <5mm Aluminium")]);
    cat.products[0].description = "Hub <b fits 50mm axle".to_owned();

    assert_eq!(clean_text(&mut cat), 0);
    assert_eq!(cat.products[0].name, "Spacer <5mm Aluminium");
    assert_eq!(cat.products[0].description, "Hub <b fits 50mm axle");
}

#[test]
fn clean_text_is_stable_for_escaped_markup() {
    let mut cat = catalog(vec![record("1", "pad", "Pad &lt;b&gt;KZ&lt;/b&gt; set")]);
    cat.products[0].description = "Tools &amp;amp; spares <!-- promo -->".to_owned();

    assert_eq!(clean_text(&mut cat), 1);
    let name = cat.products[0].name.clone();
    let description = cat.products[0].description.clone();
    assert_eq!(name, "Pad KZ set");
    assert_eq!(description, "Tools & spares");

    assert_eq!(clean_text(&mut cat), 0);
    assert_eq!(cat.products[0].name, name);
    assert_eq!(cat.products[0].description, description);
}

#[test]
fn set_description_renders_template_for_matches() {
    let mut pad = record("1", "pad", "CRG Brake Pad");
    pad.subcategory = Some("brake-pads".to_owned());
    let mut cat = catalog(vec![pad, record("2", "chain", "Chain 219")]);

    let changed = set_description(&mut cat, "brake pad", "{name} ({brand}, {category}/{subcategory})").unwrap();

    assert_eq!(changed, 1);
    assert_eq!(cat.products[0].description, "CRG Brake Pad (CRG, brakes/brake-pads)");
    assert!(cat.products[1].description.is_empty());
}
