//! Record builders shared by the unit tests.

use kartsync_core::{Catalog, ProductRecord};
use serde_json::Map;

pub(crate) fn record(id: &str, slug: &str, name: &str) -> ProductRecord {
    ProductRecord {
        id: id.to_owned(),
        name: name.to_owned(),
        slug: slug.to_owned(),
        category: "brakes".to_owned(),
        subcategory: None,
        brand: "CRG".to_owned(),
        price: "1000".to_owned(),
        discounted_price: None,
        original_price: None,
        image: None,
        image_local: None,
        description: String::new(),
        in_stock: true,
        specifications: None,
        mondokart_url: None,
        featured: None,
        extra: Map::new(),
    }
}

pub(crate) fn catalog(records: Vec<ProductRecord>) -> Catalog {
    Catalog::new(records)
}

pub(crate) fn ids(catalog: &Catalog) -> Vec<&str> {
    catalog.products.iter().map(|p| p.id.as_str()).collect()
}
