use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Another run holds the catalog lock.
    #[error("catalog is locked by another run (lock file {path})")]
    Locked { path: String },

    /// A merge would leave two records with the same id.
    #[error("merge would create duplicate id {id}")]
    IdConflict { id: String },

    #[error("invalid price \"{value}\": {reason}")]
    InvalidPrice { value: String, reason: String },

    #[error("invalid name pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("no product with id {id}")]
    NotFound { id: String },
}

impl CatalogError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
