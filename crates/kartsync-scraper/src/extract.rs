//! Candidate extraction from listing pages.
//!
//! A malformed tile never aborts a page: tiles without a name are skipped,
//! tiles without a usable price are kept but flagged, and both are counted
//! so the caller can print an end-of-batch summary.

use kartsync_core::{slugify, ScrapedCandidate};
use scraper::{ElementRef, Html};

use crate::client::absolutize_url;
use crate::price::parse_price;
use crate::selectors::{CompiledField, CompiledSelectors};

/// Result of extracting one document.
#[derive(Debug, Default)]
pub struct Extraction {
    pub candidates: Vec<ScrapedCandidate>,
    /// Tiles dropped because no name selector matched.
    pub skipped: usize,
    /// Candidates kept with a missing or zero price.
    pub flagged: usize,
}

impl Extraction {
    /// Folds another page's results into this one.
    pub fn absorb(&mut self, other: Extraction) {
        self.candidates.extend(other.candidates);
        self.skipped += other.skipped;
        self.flagged += other.flagged;
    }
}

/// Extracts candidate products from a listing document.
///
/// `base_url` is the page's final URL; relative image and product links are
/// resolved against it.
#[must_use]
pub fn extract_candidates(html: &str, selectors: &CompiledSelectors, base_url: &str) -> Extraction {
    let document = Html::parse_document(html);
    let mut extraction = Extraction::default();

    for item in document.select(&selectors.item) {
        let Some(name) = first_value(item, &selectors.name) else {
            extraction.skipped += 1;
            tracing::debug!(base_url, "skipping product tile without a name");
            continue;
        };

        let price = first_value(item, &selectors.price)
            .as_deref()
            .and_then(parse_price);
        let original_price = first_value(item, &selectors.original_price)
            .as_deref()
            .and_then(parse_price)
            .filter(|orig| price.is_some_and(|p| *orig > p));

        let flagged = price.is_none();
        if flagged {
            extraction.flagged += 1;
            tracing::warn!(name = %name, base_url, "product has no usable price; flagged");
        }

        let image_url =
            first_value(item, &selectors.image).and_then(|raw| absolutize_url(base_url, &raw));
        let url = first_value(item, &selectors.link).and_then(|raw| absolutize_url(base_url, &raw));
        let brand = first_value(item, &selectors.brand);

        extraction.candidates.push(ScrapedCandidate {
            slug: slugify(&name),
            name,
            price: price.map(|p| p.to_string()).unwrap_or_default(),
            original_price: original_price.map(|p| p.to_string()),
            image_url,
            url,
            brand,
            category: None,
            flagged,
        });
    }

    tracing::info!(
        base_url,
        extracted = extraction.candidates.len(),
        skipped = extraction.skipped,
        flagged = extraction.flagged,
        "extracted listing page"
    );
    extraction
}

/// Returns the absolute URL of the next listing page, if the document links
/// to one.
#[must_use]
pub fn next_page_url(html: &str, selectors: &CompiledSelectors, base_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    first_value(document.root_element(), &selectors.next_page)
        .and_then(|raw| absolutize_url(base_url, &raw))
        .filter(|next| next != base_url)
}

/// Evaluates `fields` in order against `scope` and returns the first
/// non-empty value, whitespace-collapsed.
fn first_value(scope: ElementRef<'_>, fields: &[CompiledField]) -> Option<String> {
    fields.iter().find_map(|field| {
        scope.select(&field.selector).find_map(|el| {
            let raw = match field.attr.as_deref() {
                Some(attr) => el.value().attr(attr).map(str::to_owned),
                None => Some(el.text().collect::<String>()),
            }?;
            let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            if collapsed.is_empty() {
                None
            } else {
                Some(collapsed)
            }
        })
    })
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
