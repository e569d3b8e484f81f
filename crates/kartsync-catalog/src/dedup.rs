//! Collapsing duplicate catalog records.
//!
//! Two records are duplicates when they share an `id`, a non-empty `slug`,
//! or a normalized name. The relation is transitive: if A shares a slug with
//! B and B shares a name with C, all three form one group. Each group keeps
//! its highest-scoring record ([`ProductRecord::score`]); on a tie the
//! record that appears first wins. The survivor takes the position of the
//! group's first member, so unrelated records keep their relative order.
//!
//! Because groups are closed under every key, no two survivors share a key
//! and a second pass finds nothing to remove.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use kartsync_core::{Catalog, ProductRecord};

/// One set of records collapsed into a single survivor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// The key that first linked the group, e.g. `slug:crg-pad` or
    /// `name:crg brake pad`.
    pub key: String,
    pub kept_id: String,
    pub removed_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub products: Vec<ProductRecord>,
    pub groups: Vec<DuplicateGroup>,
}

impl DedupOutcome {
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.groups.iter().map(|g| g.removed_ids.len()).sum()
    }
}

/// Disjoint-set forest whose root is always the smallest index in its set.
struct Groups {
    parent: Vec<usize>,
    key: Vec<Option<String>>,
}

impl Groups {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            key: vec![None; n],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize, key: &str) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[child] = root;
        let inherited = self.key[root].take().or_else(|| self.key[child].take());
        self.key[root] = inherited.or_else(|| Some(key.to_owned()));
    }
}

fn identity_keys(record: &ProductRecord) -> Vec<String> {
    let mut keys = vec![format!("id:{}", record.id)];
    if !record.slug.trim().is_empty() {
        keys.push(format!("slug:{}", record.slug));
    }
    let name = record.normalized_name();
    if !name.is_empty() {
        keys.push(format!("name:{name}"));
    }
    keys
}

/// Collapses duplicates in `products`, preserving first-occurrence order.
#[must_use]
pub fn deduplicate(products: Vec<ProductRecord>) -> DedupOutcome {
    let n = products.len();
    let mut groups = Groups::new(n);
    let mut first_seen: HashMap<String, usize> = HashMap::new();

    for (i, record) in products.iter().enumerate() {
        for key in identity_keys(record) {
            match first_seen.entry(key) {
                Entry::Occupied(e) => groups.union(*e.get(), i, e.key()),
                Entry::Vacant(e) => {
                    e.insert(i);
                }
            }
        }
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        let root = groups.find(i);
        members[root].push(i);
    }

    let mut slots: Vec<Option<ProductRecord>> = products.into_iter().map(Some).collect();
    let mut outcome = DedupOutcome::default();

    for (root, group) in members.iter().enumerate() {
        if group.is_empty() {
            continue;
        }
        let mut winner = group[0];
        let mut best = slots[winner].as_ref().map_or(0, ProductRecord::score);
        for &i in &group[1..] {
            let score = slots[i].as_ref().map_or(0, ProductRecord::score);
            if score > best {
                winner = i;
                best = score;
            }
        }

        let Some(kept) = slots[winner].take() else {
            continue;
        };
        if group.len() > 1 {
            let removed_ids: Vec<String> = group
                .iter()
                .filter(|&&i| i != winner)
                .filter_map(|&i| slots[i].take().map(|r| r.id))
                .collect();
            let key = groups.key[root].clone().unwrap_or_default();
            tracing::info!(
                key = %key,
                kept = %kept.id,
                removed = removed_ids.len(),
                "collapsed duplicate group"
            );
            outcome.groups.push(DuplicateGroup {
                key,
                kept_id: kept.id.clone(),
                removed_ids,
            });
        }
        outcome.products.push(kept);
    }

    outcome
}

/// Deduplicates the catalog in place and returns the collapsed groups.
pub fn dedup_catalog(catalog: &mut Catalog) -> Vec<DuplicateGroup> {
    let outcome = deduplicate(std::mem::take(&mut catalog.products));
    catalog.products = outcome.products;
    outcome.groups
}

#[cfg(test)]
#[path = "dedup_test.rs"]
mod tests;
