//! The catalog document and its product records.
//!
//! ## Observed shape of the storefront's `products.json`
//!
//! ### Prices
//! Stored as decimal strings (`"12990"`, `"45.50"`). Some correction scripts
//! historically wrote bare JSON numbers, so both forms are accepted on read
//! and normalized to strings.
//!
//! ### `inStock`
//! Absent on older records; absent means in stock.
//!
//! ### Unknown fields
//! Ad-hoc scripts add optional fields without any schema version. Anything
//! this crate does not model is captured in `extra` and written back
//! unchanged, so a load/save cycle never drops data.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::slug::normalize_name;

/// The whole catalog file: `{ "products": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub products: Vec<ProductRecord>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Catalog {
    #[must_use]
    pub fn new(products: Vec<ProductRecord>) -> Self {
        Self {
            products,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&ProductRecord> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut ProductRecord> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    #[must_use]
    pub fn contains_slug(&self, slug: &str) -> bool {
        self.products.iter().any(|p| p.slug == slug)
    }

    /// Every slug currently present, for membership checks in bulk.
    #[must_use]
    pub fn slugs(&self) -> HashSet<&str> {
        self.products.iter().map(|p| p.slug.as_str()).collect()
    }
}

/// A single product as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Stable identifier, e.g. `"mk-iame-x30-piston"`. The part before the
    /// first `-` names the import batch the record came from.
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub brand: String,
    /// Current selling price as a decimal string.
    #[serde(deserialize_with = "decimal_string")]
    pub price: String,
    #[serde(
        default,
        deserialize_with = "optional_decimal_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub discounted_price: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_decimal_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<String>,
    /// Remote image URL on the source site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Web-root relative path of the cached copy, e.g. `"/images/products/<slug>.jpg"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_local: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<BTreeMap<String, Value>>,
    /// Provenance link back to the source product page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mondokart_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductRecord {
    /// Completeness heuristic used to pick a survivor among duplicates:
    /// two points for a cached image plus one point per full hundred
    /// characters of description.
    #[must_use]
    pub fn score(&self) -> usize {
        let image_points = if self.has_local_image() { 2 } else { 0 };
        image_points + self.description.chars().count() / 100
    }

    #[must_use]
    pub fn has_local_image(&self) -> bool {
        self.image_local.as_deref().is_some_and(|s| !s.is_empty())
    }

    #[must_use]
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Returns `true` if an original price above the current one was observed.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.original_price.is_some()
    }
}

fn default_in_stock() -> bool {
    true
}

fn decimal_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a decimal string or number, got {other}"
        ))),
    }
}

fn optional_decimal_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a decimal string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
