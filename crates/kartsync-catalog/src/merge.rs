//! Applying an enriched batch to the catalog.
//!
//! The caller always names the mode; nothing is inferred from id
//! conventions. Every mode validates the whole batch before touching the
//! catalog, so a rejected batch leaves it unchanged.

use std::collections::HashSet;
use std::fmt;

use kartsync_core::{Catalog, ProductRecord};

use crate::error::CatalogError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeMode {
    /// Drop every record whose id starts with `prefix`, then append the batch.
    PrefixReplace { prefix: String },
    /// Append only records whose slug is not already present.
    Additive,
    /// Replace records with an equal id in place, append the rest.
    Upsert,
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrefixReplace { prefix } => write!(f, "prefix-replace({prefix})"),
            Self::Additive => f.write_str("additive"),
            Self::Upsert => f.write_str("upsert"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Existing records deleted by a prefix replace.
    pub removed: usize,
    /// Batch records appended.
    pub inserted: usize,
    /// Existing records overwritten by an upsert.
    pub replaced: usize,
    /// Batch records dropped because their slug was already present.
    pub skipped: usize,
}

/// Merges `batch` into `catalog` according to `mode`.
///
/// # Errors
///
/// Returns [`CatalogError::IdConflict`] if the result would contain two
/// records with the same id; the catalog is not modified in that case.
pub fn merge(
    catalog: &mut Catalog,
    batch: Vec<ProductRecord>,
    mode: &MergeMode,
) -> Result<MergeReport, CatalogError> {
    let report = match mode {
        MergeMode::PrefixReplace { prefix } => prefix_replace(catalog, batch, prefix)?,
        MergeMode::Additive => additive(catalog, batch)?,
        MergeMode::Upsert => upsert(catalog, batch)?,
    };
    tracing::info!(
        mode = %mode,
        removed = report.removed,
        inserted = report.inserted,
        replaced = report.replaced,
        skipped = report.skipped,
        total = catalog.len(),
        "merge complete"
    );
    Ok(report)
}

fn prefix_replace(
    catalog: &mut Catalog,
    batch: Vec<ProductRecord>,
    prefix: &str,
) -> Result<MergeReport, CatalogError> {
    let mut ids: HashSet<&str> = catalog
        .products
        .iter()
        .filter(|p| !p.id.starts_with(prefix))
        .map(|p| p.id.as_str())
        .collect();
    for record in &batch {
        if !ids.insert(record.id.as_str()) {
            return Err(CatalogError::IdConflict {
                id: record.id.clone(),
            });
        }
        if !record.id.starts_with(prefix) {
            tracing::warn!(
                id = %record.id,
                prefix,
                "batch record does not carry the replaced prefix; a later replace will not remove it"
            );
        }
    }

    let before = catalog.len();
    catalog.products.retain(|p| !p.id.starts_with(prefix));
    let removed = before - catalog.len();
    let inserted = batch.len();
    catalog.products.extend(batch);

    Ok(MergeReport {
        removed,
        inserted,
        ..MergeReport::default()
    })
}

fn additive(catalog: &mut Catalog, batch: Vec<ProductRecord>) -> Result<MergeReport, CatalogError> {
    let mut slugs: HashSet<String> = catalog.slugs().into_iter().map(str::to_owned).collect();
    let mut ids: HashSet<String> = catalog.products.iter().map(|p| p.id.clone()).collect();

    let mut accepted = Vec::new();
    let mut skipped = 0;
    for record in batch {
        if slugs.contains(&record.slug) {
            tracing::debug!(slug = %record.slug, "slug already present, skipping");
            skipped += 1;
            continue;
        }
        if !ids.insert(record.id.clone()) {
            return Err(CatalogError::IdConflict { id: record.id });
        }
        slugs.insert(record.slug.clone());
        accepted.push(record);
    }

    let inserted = accepted.len();
    catalog.products.extend(accepted);
    Ok(MergeReport {
        inserted,
        skipped,
        ..MergeReport::default()
    })
}

fn upsert(catalog: &mut Catalog, batch: Vec<ProductRecord>) -> Result<MergeReport, CatalogError> {
    let mut seen = HashSet::new();
    for record in &batch {
        if !seen.insert(record.id.as_str()) {
            return Err(CatalogError::IdConflict {
                id: record.id.clone(),
            });
        }
    }

    let mut report = MergeReport::default();
    for record in batch {
        if let Some(existing) = catalog.find_by_id_mut(&record.id) {
            *existing = record;
            report.replaced += 1;
        } else {
            catalog.products.push(record);
            report.inserted += 1;
        }
    }
    Ok(report)
}

#[cfg(test)]
#[path = "merge_test.rs"]
mod tests;
