pub mod corrections;
pub mod dedup;
pub mod error;
pub mod merge;
pub mod repository;
pub mod stats;

#[cfg(test)]
mod fixtures;

pub use corrections::{clean_text, correct_price, reassign_category, set_description};
pub use dedup::{dedup_catalog, deduplicate, DedupOutcome, DuplicateGroup};
pub use error::CatalogError;
pub use merge::{merge, MergeMode, MergeReport};
pub use repository::{CatalogLock, CatalogRepository};
pub use stats::CatalogStats;
