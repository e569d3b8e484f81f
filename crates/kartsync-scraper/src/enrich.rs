//! Turns scraped candidates into catalog records.

use kartsync_core::{ProductRecord, ScrapedCandidate};
use serde_json::Map;

use crate::download::image_file_name;
use crate::price::parse_price;
use crate::rules::{render_template, BrandTable, RuleTable};

pub const UNKNOWN_BRAND: &str = "Unknown";

/// Everything an import knows about the batch besides the candidates
/// themselves.
#[derive(Debug, Clone)]
pub struct EnrichContext<'a> {
    pub category: &'a str,
    /// Used when no rule assigns a subcategory.
    pub subcategory: Option<&'a str>,
    /// Used when no brand is detected in the name or scraped with the item.
    pub brand: Option<&'a str>,
    /// Record ids become `<id_prefix>-<slug>`.
    pub id_prefix: &'a str,
    /// Web path of the image store, e.g. `/images/products`.
    pub image_path_prefix: &'a str,
    /// Whether the candidate's image is present in the local store.
    pub local_image: bool,
    pub rules: &'a RuleTable,
    pub brands: &'a BrandTable,
}

/// Builds a catalog record from a candidate.
///
/// Pure: the same candidate and context always produce the same record.
///
/// Brand resolution order: a brand alias in the name, the brand scraped with
/// the item, the context default, then [`UNKNOWN_BRAND`].
///
/// When the candidate carries an original price above its price, the record
/// is a promotion: `price` and `discountedPrice` hold the promotional price
/// and `originalPrice` the pre-promotion one.
#[must_use]
pub fn enrich(candidate: &ScrapedCandidate, ctx: &EnrichContext<'_>) -> ProductRecord {
    let name = candidate.name.trim().to_owned();
    let slug = candidate.effective_slug();

    let brand = ctx
        .brands
        .detect(&name)
        .map(str::to_owned)
        .or_else(|| {
            candidate
                .brand
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_owned)
        })
        .or_else(|| ctx.brand.map(str::to_owned))
        .unwrap_or_else(|| UNKNOWN_BRAND.to_owned());

    let rule = ctx.rules.first_match(&name);
    let category = rule
        .and_then(|r| r.category.as_deref())
        .unwrap_or(ctx.category)
        .to_owned();
    let subcategory = rule
        .and_then(|r| r.subcategory.as_deref())
        .or(ctx.subcategory)
        .map(str::to_owned);
    let template = rule.map_or(ctx.rules.fallback.as_str(), |r| r.description.as_str());
    let description = render_template(
        template,
        &name,
        &brand,
        &category,
        subcategory.as_deref().unwrap_or(""),
    );

    let price = parse_price(&candidate.price);
    let original = candidate.original_price.as_deref().and_then(parse_price);
    let (price, discounted_price, original_price) = match (price, original) {
        (Some(p), Some(o)) if o > p => (p.to_string(), Some(p.to_string()), Some(o.to_string())),
        (Some(p), _) => (p.to_string(), None, None),
        (None, _) => ("0".to_owned(), None, None),
    };

    let image_local = ctx.local_image.then(|| {
        format!(
            "{}/{}",
            ctx.image_path_prefix.trim_end_matches('/'),
            image_file_name(&slug)
        )
    });

    ProductRecord {
        id: format!("{}-{}", ctx.id_prefix, slug),
        name,
        slug,
        category,
        subcategory,
        brand,
        price,
        discounted_price,
        original_price,
        image: candidate.image_url.clone(),
        image_local,
        description,
        in_stock: true,
        specifications: None,
        mondokart_url: candidate.url.clone(),
        featured: None,
        extra: Map::new(),
    }
}
