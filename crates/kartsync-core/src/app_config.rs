use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The catalog document, `{ "products": [...] }`.
    pub catalog_path: PathBuf,
    /// Directory holding `<slug>.jpg` image files.
    pub images_dir: PathBuf,
    /// Prefix written into `imageLocal`, e.g. `/images/products`.
    pub image_path_prefix: String,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Delay between listing-page fetches.
    pub fetch_delay_ms: u64,
    /// Politeness delay between image downloads.
    pub download_delay_ms: u64,
    pub download_concurrency: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Upper bound on listing pages followed per start URL.
    pub max_pages: usize,
}
