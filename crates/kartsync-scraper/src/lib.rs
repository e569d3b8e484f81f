#[cfg(feature = "browser")]
pub mod browser;
pub mod client;
pub mod download;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod price;
pub mod retry;
pub mod rules;
pub mod selectors;
pub mod sitemap;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use client::{absolutize_url, FetchedPage, HttpFetcher, PageSource};
pub use download::{
    image_file_name, AssetDownloader, DownloadJob, DownloadOptions, DownloadOutcome,
    DownloadReport, HttpTransport, ImageTransport,
};
pub use enrich::{enrich, EnrichContext};
pub use error::ScraperError;
pub use extract::{extract_candidates, next_page_url, Extraction};
pub use price::parse_price;
pub use retry::{Clock, RetryPolicy, TokioClock};
pub use rules::{BrandTable, Matcher, Rule, RuleTable};
pub use selectors::{load_selectors, FieldSelector, SelectorSet};
pub use sitemap::{collect_product_urls, parse_sitemap, sitemap_url_for, Sitemap};
