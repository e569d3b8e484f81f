//! End-to-end catalog maintenance through the repository: merge, dedup and
//! corrections against a catalog file in a temporary directory.

use serde_json::{json, Value};

use kartsync_catalog::{
    clean_text, dedup_catalog, merge, CatalogError, CatalogRepository, MergeMode,
};
use kartsync_core::{Catalog, ProductRecord};

fn product(id: &str, slug: &str, name: &str) -> ProductRecord {
    serde_json::from_value(json!({
        "id": id,
        "slug": slug,
        "name": name,
        "category": "brakes",
        "price": "1000"
    }))
    .unwrap()
}

fn write_catalog(repo: &CatalogRepository, products: Value) {
    let catalog: Catalog = serde_json::from_value(json!({ "products": products })).unwrap();
    repo.save(&catalog).unwrap();
}

#[test]
fn additive_merge_of_existing_slug_then_dedup_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let repo = CatalogRepository::new(dir.path().join("products.json"));
    write_catalog(
        &repo,
        json!([{ "id": "x-1", "slug": "a", "name": "Foo", "category": "brakes", "price": "1" }]),
    );
    let before = std::fs::read_to_string(repo.path()).unwrap();

    let report = repo
        .update(|catalog| merge(catalog, vec![product("x-2", "a", "foo")], &MergeMode::Additive))
        .unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(repo.load().unwrap().len(), 1);
    assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), before);

    write_catalog(
        &repo,
        json!([
            { "id": "x-1", "slug": "a", "name": "Foo", "category": "brakes", "price": "1" },
            { "id": "x-2", "slug": "b", "name": "foo", "category": "brakes", "price": "1" }
        ]),
    );
    let groups = repo.update(|catalog| Ok(dedup_catalog(catalog))).unwrap();

    assert_eq!(groups.iter().map(|g| g.removed_ids.len()).sum::<usize>(), 1);
    let after = repo.load().unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after.products[0].id, "x-1");

    let again = repo.update(|catalog| Ok(dedup_catalog(catalog))).unwrap();
    assert!(again.is_empty());
}

#[test]
fn prefix_replace_round_trips_unknown_fields_of_untouched_records() {
    let dir = tempfile::tempdir().unwrap();
    let repo = CatalogRepository::new(dir.path().join("products.json"));
    write_catalog(
        &repo,
        json!([
            { "id": "mk-1", "slug": "old", "name": "Old", "category": "brakes", "price": "1" },
            {
                "id": "fk-1", "slug": "keep", "name": "Keep", "category": "engine", "price": 250,
                "featured": true, "specifications": { "bore": "54mm" }, "warehouseBin": "C-12"
            }
        ]),
    );
    let kept_before = repo.load().unwrap().find_by_id("fk-1").cloned().unwrap();

    repo.update(|catalog| {
        merge(
            catalog,
            vec![product("mk-2", "new", "New")],
            &MergeMode::PrefixReplace {
                prefix: "mk-".to_owned(),
            },
        )
    })
    .unwrap();

    let after = repo.load().unwrap();
    let ids: Vec<&str> = after.products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["fk-1", "mk-2"]);
    assert_eq!(after.find_by_id("fk-1"), Some(&kept_before));
    assert_eq!(after.products[0].extra["warehouseBin"], json!("C-12"));
}

#[test]
fn conflicting_batch_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let repo = CatalogRepository::new(dir.path().join("products.json"));
    write_catalog(
        &repo,
        json!([{ "id": "x-1", "slug": "a", "name": "A", "category": "brakes", "price": "1" }]),
    );
    let before = std::fs::read_to_string(repo.path()).unwrap();

    let result = repo.update(|catalog| {
        merge(
            catalog,
            vec![product("x-1", "other", "Other")],
            &MergeMode::Additive,
        )
    });

    assert!(matches!(result, Err(CatalogError::IdConflict { .. })));
    assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), before);
}

#[test]
fn clean_text_via_update_counts_changes() {
    let dir = tempfile::tempdir().unwrap();
    let repo = CatalogRepository::new(dir.path().join("products.json"));
    write_catalog(
        &repo,
        json!([{
            "id": "x-1", "slug": "a", "name": "Pad &amp; Clip", "category": "brakes",
            "price": "1", "description": "<p>Fits all</p>"
        }]),
    );

    let changed = repo.update(|catalog| Ok(clean_text(catalog))).unwrap();

    assert_eq!(changed, 1);
    let record = &repo.load().unwrap().products[0];
    assert_eq!(record.name, "Pad & Clip");
    assert_eq!(record.description, "Fits all");
}
