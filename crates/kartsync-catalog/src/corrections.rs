//! Targeted in-place fixes applied after an import.
//!
//! Each function mutates the loaded catalog and returns how many records
//! actually changed; the caller saves once.

use std::str::FromStr;
use std::sync::LazyLock;

use kartsync_core::{render_template, Catalog};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;

use crate::error::CatalogError;

/// Compiles a case-insensitive name pattern.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidPattern`] for an invalid regex.
pub fn name_pattern(pattern: &str) -> Result<Regex, CatalogError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| CatalogError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })
}

/// Moves every record whose name matches `pattern` into `category`.
///
/// `subcategory` replaces the record's subcategory when given; otherwise the
/// existing one is kept.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidPattern`] for an invalid regex.
pub fn reassign_category(
    catalog: &mut Catalog,
    pattern: &str,
    category: &str,
    subcategory: Option<&str>,
) -> Result<usize, CatalogError> {
    let re = name_pattern(pattern)?;
    let mut changed = 0;
    for record in catalog.products.iter_mut().filter(|r| re.is_match(&r.name)) {
        let new_sub = subcategory.map(str::to_owned).or_else(|| record.subcategory.clone());
        if record.category != category || record.subcategory != new_sub {
            tracing::debug!(id = %record.id, from = %record.category, to = category, "reassigning category");
            record.category = category.to_owned();
            record.subcategory = new_sub;
            changed += 1;
        }
    }
    Ok(changed)
}

/// Parses a positive decimal price.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidPrice`] if `value` is not a positive
/// decimal.
pub fn validate_price(value: &str) -> Result<Decimal, CatalogError> {
    let parsed = Decimal::from_str(value.trim()).map_err(|e| CatalogError::InvalidPrice {
        value: value.to_owned(),
        reason: e.to_string(),
    })?;
    if parsed <= Decimal::ZERO {
        return Err(CatalogError::InvalidPrice {
            value: value.to_owned(),
            reason: "must be greater than zero".to_owned(),
        });
    }
    Ok(parsed.normalize())
}

/// Sets the price of record `id`.
///
/// With an `original_price` above `price` the record becomes a promotion
/// (`discountedPrice` = `price`); without one any promotion is cleared.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidPrice`] for a non-positive or malformed
/// price, or an original price not above the price, and
/// [`CatalogError::NotFound`] if no record has `id`.
pub fn correct_price(
    catalog: &mut Catalog,
    id: &str,
    price: &str,
    original_price: Option<&str>,
) -> Result<usize, CatalogError> {
    let new_price = validate_price(price)?;
    let new_original = original_price.map(validate_price).transpose()?;
    if let Some(orig) = new_original.filter(|orig| *orig <= new_price) {
        return Err(CatalogError::InvalidPrice {
            value: orig.to_string(),
            reason: format!("original price must be above the price {new_price}"),
        });
    }

    let price = new_price.to_string();
    let original = new_original.map(|d| d.to_string());
    let record = catalog
        .find_by_id_mut(id)
        .ok_or_else(|| CatalogError::NotFound { id: id.to_owned() })?;

    let discounted = original.as_ref().map(|_| price.clone());
    if record.price == price && record.discounted_price == discounted && record.original_price == original {
        return Ok(0);
    }
    tracing::info!(id, old = %record.price, new = %price, "correcting price");
    record.price = price;
    record.discounted_price = discounted;
    record.original_price = original;
    Ok(1)
}

/// Strips markup, decodes common entities and collapses whitespace in every
/// name and description.
pub fn clean_text(catalog: &mut Catalog) -> usize {
    let mut changed = 0;
    for record in &mut catalog.products {
        let name = clean(&record.name);
        let description = clean(&record.description);
        if name != record.name || description != record.description {
            record.name = name;
            record.description = description;
            changed += 1;
        }
    }
    changed
}

/// Renders `template` into the description of every record whose name
/// matches `pattern`.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidPattern`] for an invalid regex.
pub fn set_description(
    catalog: &mut Catalog,
    pattern: &str,
    template: &str,
) -> Result<usize, CatalogError> {
    let re = name_pattern(pattern)?;
    let mut changed = 0;
    for record in catalog.products.iter_mut().filter(|r| re.is_match(&r.name)) {
        let description = render_template(
            template,
            &record.name,
            &record.brand,
            &record.category,
            record.subcategory.as_deref().unwrap_or(""),
        );
        if description != record.description {
            record.description = description;
            changed += 1;
        }
    }
    Ok(changed)
}

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z][^<>]*>").expect("valid regex")
});

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(nbsp|quot|#39|#x27|apos|lt|gt|ndash|amp);").expect("valid regex")
});

/// Strips complete tags, decodes entities and collapses whitespace until the
/// text stops changing, so a cleaned value is left alone by the next run. A
/// bare `<` with no closing `>` is kept as text.
fn clean(text: &str) -> String {
    let mut current = text.to_owned();
    loop {
        let next = clean_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn clean_once(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, " ");
    let decoded = decode_entities(&stripped);
    TAG_RE
        .replace_all(&decoded, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decodes each entity exactly once; `&amp;lt;` becomes `&lt;`, not `<`.
fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| match &caps[1] {
            "nbsp" => " ",
            "quot" => "\"",
            "#39" | "#x27" | "apos" => "'",
            "lt" => "<",
            "gt" => ">",
            "ndash" => "-",
            _ => "&",
        })
        .into_owned()
}

#[cfg(test)]
#[path = "corrections_test.rs"]
mod tests;
