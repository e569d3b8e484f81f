//! Catalog health summary.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use kartsync_core::Catalog;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    /// Record count per category, sorted by category name.
    pub per_category: BTreeMap<String, usize>,
    pub missing_local_image: usize,
    /// Records whose price is empty, zero or not a decimal.
    pub missing_price: usize,
    pub out_of_stock: usize,
    pub discounted: usize,
}

impl CatalogStats {
    #[must_use]
    pub fn collect(catalog: &Catalog) -> Self {
        let mut stats = Self {
            total: catalog.len(),
            ..Self::default()
        };
        for record in &catalog.products {
            *stats.per_category.entry(record.category.clone()).or_default() += 1;
            if !record.has_local_image() {
                stats.missing_local_image += 1;
            }
            let priced = Decimal::from_str(record.price.trim()).is_ok_and(|p| p > Decimal::ZERO);
            if !priced {
                stats.missing_price += 1;
            }
            if !record.in_stock {
                stats.out_of_stock += 1;
            }
            if record.is_discounted() {
                stats.discounted += 1;
            }
        }
        stats
    }
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "products:            {}", self.total)?;
        for (category, count) in &self.per_category {
            writeln!(f, "  {category:<18} {count}")?;
        }
        writeln!(f, "missing local image: {}", self.missing_local_image)?;
        writeln!(f, "missing price:       {}", self.missing_price)?;
        writeln!(f, "out of stock:        {}", self.out_of_stock)?;
        write!(f, "discounted:          {}", self.discounted)
    }
}
