//! Source-specific selector sets for the extractor.
//!
//! A selector set is data: each field lists selectors in priority order and
//! the first one producing a non-empty value wins. Sets can be loaded from
//! YAML so a new source needs no code change:
//!
//! ```yaml
//! item: "article.product-miniature"
//! name:
//!   - css: ".product-title a"
//!   - css: ".product-title a"
//!     attr: title
//!   - css: "img"
//!     attr: alt
//! price:
//!   - css: ".price"
//! ```

use std::path::Path;

use kartsync_core::ConfigError;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

/// One way of reading a field: text content of the first element matching
/// `css`, or the value of `attr` on that element when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub css: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
}

impl FieldSelector {
    #[must_use]
    pub fn text(css: &str) -> Self {
        Self {
            css: css.to_owned(),
            attr: None,
        }
    }

    #[must_use]
    pub fn attr(css: &str, attr: &str) -> Self {
        Self {
            css: css.to_owned(),
            attr: Some(attr.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    /// Container matching one product tile on a listing page.
    pub item: String,
    pub name: Vec<FieldSelector>,
    #[serde(default)]
    pub price: Vec<FieldSelector>,
    /// Struck-through pre-promotion price.
    #[serde(default)]
    pub original_price: Vec<FieldSelector>,
    #[serde(default)]
    pub image: Vec<FieldSelector>,
    #[serde(default)]
    pub link: Vec<FieldSelector>,
    #[serde(default)]
    pub brand: Vec<FieldSelector>,
    /// Link to the next listing page, evaluated against the whole document.
    #[serde(default)]
    pub next_page: Vec<FieldSelector>,
}

impl SelectorSet {
    /// Selector set for the source storefront's product-miniature listing
    /// markup.
    ///
    /// Name priority: title link text, then the link's `title` attribute,
    /// then the thumbnail's `alt` text. Images prefer lazy-load attributes
    /// over `src`, which holds a placeholder until scripts run.
    #[must_use]
    pub fn storefront_default() -> Self {
        Self {
            item: "article.product-miniature, div.product-miniature".to_owned(),
            name: vec![
                FieldSelector::text(".product-title a"),
                FieldSelector::text(".product-title"),
                FieldSelector::attr("a[title]", "title"),
                FieldSelector::attr("img[alt]", "alt"),
            ],
            price: vec![
                FieldSelector::attr("[itemprop=price]", "content"),
                FieldSelector::text(".product-price-and-shipping .price"),
                FieldSelector::text(".price"),
            ],
            original_price: vec![FieldSelector::text(".regular-price")],
            image: vec![
                FieldSelector::attr("img", "data-full-size-image-url"),
                FieldSelector::attr("img", "data-src"),
                FieldSelector::attr("img", "src"),
            ],
            link: vec![
                FieldSelector::attr(".product-title a", "href"),
                FieldSelector::attr("a.thumbnail", "href"),
                FieldSelector::attr("a", "href"),
            ],
            brand: vec![FieldSelector::text(".product-brand")],
            next_page: vec![
                FieldSelector::attr("a[rel=next]", "href"),
                FieldSelector::attr(".pagination a.next", "href"),
            ],
        }
    }

    /// Parses every CSS selector up front so a typo fails the run before
    /// any page is fetched.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Selector`] for the first invalid selector.
    pub fn compile(&self) -> Result<CompiledSelectors, ScraperError> {
        Ok(CompiledSelectors {
            item: parse_selector(&self.item)?,
            name: compile_fields(&self.name)?,
            price: compile_fields(&self.price)?,
            original_price: compile_fields(&self.original_price)?,
            image: compile_fields(&self.image)?,
            link: compile_fields(&self.link)?,
            brand: compile_fields(&self.brand)?,
            next_page: compile_fields(&self.next_page)?,
        })
    }
}

/// Load a selector set from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or defines no
/// name selectors.
pub fn load_selectors(path: &Path) -> Result<SelectorSet, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SelectorsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let set: SelectorSet =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::SelectorsFileParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    if set.name.is_empty() {
        return Err(ConfigError::SelectorsFileParse {
            path: path.display().to_string(),
            reason: "at least one name selector is required".to_string(),
        });
    }

    Ok(set)
}

#[derive(Debug)]
pub(crate) struct CompiledField {
    pub(crate) selector: Selector,
    pub(crate) attr: Option<String>,
}

/// A [`SelectorSet`] with every CSS expression parsed.
#[derive(Debug)]
pub struct CompiledSelectors {
    pub(crate) item: Selector,
    pub(crate) name: Vec<CompiledField>,
    pub(crate) price: Vec<CompiledField>,
    pub(crate) original_price: Vec<CompiledField>,
    pub(crate) image: Vec<CompiledField>,
    pub(crate) link: Vec<CompiledField>,
    pub(crate) brand: Vec<CompiledField>,
    pub(crate) next_page: Vec<CompiledField>,
}

fn parse_selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::Selector {
        selector: css.to_owned(),
        reason: e.to_string(),
    })
}

fn compile_fields(fields: &[FieldSelector]) -> Result<Vec<CompiledField>, ScraperError> {
    fields
        .iter()
        .map(|f| {
            Ok(CompiledField {
                selector: parse_selector(&f.css)?,
                attr: f.attr.clone(),
            })
        })
        .collect()
}
