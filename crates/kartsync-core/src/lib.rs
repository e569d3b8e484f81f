pub mod app_config;
pub mod candidate;
pub mod catalog;
pub mod config;
pub mod slug;
pub mod template;

pub use app_config::AppConfig;
pub use candidate::ScrapedCandidate;
pub use catalog::{Catalog, ProductRecord};
pub use config::{load_app_config, load_app_config_from_env};
pub use slug::{normalize_name, slugify};
pub use template::render_template;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read selectors file {path}: {source}")]
    SelectorsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse selectors file {path}: {reason}")]
    SelectorsFileParse { path: String, reason: String },
}
