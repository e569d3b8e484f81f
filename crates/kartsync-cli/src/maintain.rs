//! Catalog maintenance command handlers. Every mutating command runs under
//! the catalog lock and rewrites the file atomically.

use kartsync_catalog::{
    clean_text, correct_price, dedup_catalog, deduplicate, reassign_category, set_description,
    CatalogRepository, CatalogStats, DuplicateGroup,
};
use kartsync_core::AppConfig;

fn repository(config: &AppConfig) -> CatalogRepository {
    CatalogRepository::new(&config.catalog_path)
}

fn print_groups(groups: &[DuplicateGroup]) {
    for group in groups {
        println!(
            "  {}: kept {}, removed {}",
            group.key,
            group.kept_id,
            group.removed_ids.join(", ")
        );
    }
}

pub(crate) fn run_dedup(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let repo = repository(config);
    let groups = if dry_run {
        deduplicate(repo.load()?.products).groups
    } else {
        repo.update(|catalog| Ok(dedup_catalog(catalog)))?
    };

    let removed: usize = groups.iter().map(|g| g.removed_ids.len()).sum();
    tracing::info!(groups = groups.len(), removed, dry_run, "deduplication complete");
    if groups.is_empty() {
        println!("no duplicates in {}", repo.path().display());
        return Ok(());
    }
    let verb = if dry_run { "would remove" } else { "removed" };
    println!("{verb} {removed} duplicates in {} groups:", groups.len());
    print_groups(&groups);
    Ok(())
}

pub(crate) fn run_recategorize(
    config: &AppConfig,
    pattern: &str,
    category: &str,
    subcategory: Option<&str>,
) -> anyhow::Result<()> {
    let changed = repository(config)
        .update(|catalog| reassign_category(catalog, pattern, category, subcategory))?;
    println!("moved {changed} records to {category}");
    Ok(())
}

pub(crate) fn run_set_price(
    config: &AppConfig,
    id: &str,
    price: &str,
    original: Option<&str>,
) -> anyhow::Result<()> {
    let changed = repository(config).update(|catalog| correct_price(catalog, id, price, original))?;
    if changed == 0 {
        println!("{id} already has that price");
    } else {
        println!("updated price of {id}");
    }
    Ok(())
}

pub(crate) fn run_describe(config: &AppConfig, pattern: &str, template: &str) -> anyhow::Result<()> {
    let changed =
        repository(config).update(|catalog| set_description(catalog, pattern, template))?;
    println!("updated {changed} descriptions");
    Ok(())
}

pub(crate) fn run_clean_text(config: &AppConfig) -> anyhow::Result<()> {
    let changed = repository(config).update(|catalog| Ok(clean_text(catalog)))?;
    println!("cleaned {changed} records");
    Ok(())
}

pub(crate) fn run_stats(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = repository(config).load()?;
    println!("{}", CatalogStats::collect(&catalog));
    Ok(())
}
