use crate::app_config::AppConfig;
use crate::ConfigError;

/// Desktop Chrome user agent. Source sites reject default HTTP-client
/// identifiers, so this is the default for both page fetches and downloads.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load sync configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a numeric variable holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load sync configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a numeric variable holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function, so tests
/// can drive it from a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let catalog_path = PathBuf::from(or_default(
        "KARTSYNC_CATALOG_PATH",
        "./data/products.json",
    ));
    let images_dir = PathBuf::from(or_default(
        "KARTSYNC_IMAGES_DIR",
        "./public/images/products",
    ));
    let image_path_prefix = or_default("KARTSYNC_IMAGE_PATH_PREFIX", "/images/products")
        .trim_end_matches('/')
        .to_string();
    let log_level = or_default("KARTSYNC_LOG_LEVEL", "info");
    let user_agent = or_default("KARTSYNC_USER_AGENT", DEFAULT_USER_AGENT);

    let request_timeout_secs = parse_u64("KARTSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let fetch_delay_ms = parse_u64("KARTSYNC_FETCH_DELAY_MS", "1000")?;
    let download_delay_ms = parse_u64("KARTSYNC_DOWNLOAD_DELAY_MS", "300")?;
    let download_concurrency = parse_usize("KARTSYNC_DOWNLOAD_CONCURRENCY", "1")?;
    let max_retries = parse_u32("KARTSYNC_MAX_RETRIES", "0")?;
    let retry_backoff_base_ms = parse_u64("KARTSYNC_RETRY_BACKOFF_BASE_MS", "500")?;
    let max_pages = parse_usize("KARTSYNC_MAX_PAGES", "50")?;

    if download_concurrency == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "KARTSYNC_DOWNLOAD_CONCURRENCY".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        catalog_path,
        images_dir,
        image_path_prefix,
        log_level,
        request_timeout_secs,
        user_agent,
        fetch_delay_ms,
        download_delay_ms,
        download_concurrency,
        max_retries,
        retry_backoff_base_ms,
        max_pages,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
