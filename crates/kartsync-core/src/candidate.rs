use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::slug::slugify;

/// An unvalidated product freshly extracted from a source page, as stored in
/// the per-category scraped-data files (`[{ "name", "slug", "price",
/// "imageUrl", ... }]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedCandidate {
    pub name: String,
    /// Derived from `name` when absent or empty; see [`ScrapedCandidate::effective_slug`].
    #[serde(default)]
    pub slug: String,
    /// Parsed price as a decimal string; empty when the page had none.
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Product page on the source site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Set by the extractor when the price was missing or parsed to zero.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flagged: bool,
}

impl ScrapedCandidate {
    #[must_use]
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self {
            name,
            slug,
            price: price.into(),
            original_price: None,
            image_url: None,
            url: None,
            brand: None,
            category: None,
            flagged: false,
        }
    }

    /// The candidate's slug, or one derived from its name when the source
    /// file left it blank.
    #[must_use]
    pub fn effective_slug(&self) -> String {
        let trimmed = self.slug.trim();
        if trimmed.is_empty() {
            slugify(&self.name)
        } else {
            trimmed.to_string()
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_string(deserializer)?.unwrap_or_default())
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a price string or number, got {other}"
        ))),
    }
}
