//! `scrape` and `sitemap` command handlers.
//!
//! A listing page that fails to fetch is logged and counted, and the crawl
//! moves on to the next start URL.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kartsync_core::{AppConfig, ScrapedCandidate};
use kartsync_scraper::selectors::CompiledSelectors;
use kartsync_scraper::{
    collect_product_urls, extract_candidates, load_selectors, next_page_url, sitemap_url_for,
    Clock, Extraction, HttpFetcher, PageSource, RetryPolicy, SelectorSet, TokioClock,
};

#[derive(Debug)]
pub(crate) struct ScrapeArgs {
    pub(crate) category: String,
    pub(crate) output: PathBuf,
    pub(crate) urls: Vec<String>,
    pub(crate) selectors: Option<PathBuf>,
    pub(crate) browser: bool,
    pub(crate) max_pages: usize,
}

#[derive(Debug, Default)]
struct Crawl {
    extraction: Extraction,
    pages: usize,
    failed_pages: usize,
}

pub(crate) fn retry_policy(config: &AppConfig) -> RetryPolicy {
    RetryPolicy::new(config.max_retries, config.retry_backoff_base_ms)
}

fn build_fetcher(config: &AppConfig) -> anyhow::Result<HttpFetcher> {
    HttpFetcher::new(
        config.request_timeout_secs,
        &config.user_agent,
        retry_policy(config),
    )
    .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))
}

/// Scrape every start URL (following pagination) into a candidates file.
///
/// # Errors
///
/// Returns an error if the selector set is invalid, the page source cannot
/// be built, or the output file cannot be written.
pub(crate) async fn run_scrape(config: &AppConfig, args: &ScrapeArgs) -> anyhow::Result<()> {
    let set = match &args.selectors {
        Some(path) => load_selectors(path)?,
        None => SelectorSet::storefront_default(),
    };
    let selectors = set.compile()?;
    let delay = Duration::from_millis(config.fetch_delay_ms);

    let crawl = if args.browser {
        crawl_with_browser(config, &args.urls, &selectors, args.max_pages, delay).await?
    } else {
        let fetcher = build_fetcher(config)?;
        crawl_pages(&fetcher, &TokioClock, &args.urls, &selectors, args.max_pages, delay).await
    };

    let Crawl {
        extraction,
        pages,
        failed_pages,
    } = crawl;
    let candidates = finalize_candidates(extraction.candidates, &args.category);
    write_candidates(&args.output, &candidates)?;

    println!(
        "scraped {} products from {pages} pages into {} ({} skipped, {} flagged, {failed_pages} pages failed)",
        candidates.len(),
        args.output.display(),
        extraction.skipped,
        extraction.flagged,
    );
    Ok(())
}

#[cfg(feature = "browser")]
async fn crawl_with_browser(
    config: &AppConfig,
    urls: &[String],
    selectors: &CompiledSelectors,
    max_pages: usize,
    delay: Duration,
) -> anyhow::Result<Crawl> {
    let browser = kartsync_scraper::BrowserFetcher::launch(
        &config.user_agent,
        Duration::from_secs(config.request_timeout_secs),
    )
    .await?;
    let result = crawl_pages(&browser, &TokioClock, urls, selectors, max_pages, delay).await;
    browser.shutdown().await;
    Ok(result)
}

#[cfg(not(feature = "browser"))]
async fn crawl_with_browser(
    _config: &AppConfig,
    _urls: &[String],
    _selectors: &CompiledSelectors,
    _max_pages: usize,
    _delay: Duration,
) -> anyhow::Result<Crawl> {
    anyhow::bail!("--browser requires kartsync to be built with the `browser` feature")
}

/// Fetches each start URL and its follow-up pages, pausing `delay` between
/// consecutive requests.
async fn crawl_pages(
    source: &dyn PageSource,
    clock: &dyn Clock,
    urls: &[String],
    selectors: &CompiledSelectors,
    max_pages: usize,
    delay: Duration,
) -> Crawl {
    let mut crawl = Crawl::default();
    let mut visited: HashSet<String> = HashSet::new();

    for start in urls {
        let mut next = Some(start.clone());
        let mut followed = 0usize;

        while let Some(url) = next.take() {
            if followed >= max_pages {
                tracing::warn!(start = %start, max_pages, "page limit reached; stopping pagination");
                break;
            }
            if !visited.insert(url.clone()) {
                tracing::debug!(url = %url, "page already visited");
                break;
            }
            if crawl.pages + crawl.failed_pages > 0 {
                clock.sleep(delay).await;
            }
            followed += 1;

            match source.fetch(&url).await {
                Ok(page) => {
                    crawl.pages += 1;
                    next = next_page_url(&page.body, selectors, &page.url);
                    crawl
                        .extraction
                        .absorb(extract_candidates(&page.body, selectors, &page.url));
                }
                Err(e) => {
                    crawl.failed_pages += 1;
                    tracing::warn!(url = %url, error = %e, "failed to fetch listing page; skipping");
                }
            }
        }
    }
    crawl
}

/// Tags candidates with the scrape category and drops repeats of a slug
/// already seen on an earlier page.
fn finalize_candidates(candidates: Vec<ScrapedCandidate>, category: &str) -> Vec<ScrapedCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| {
            let fresh = seen.insert(c.effective_slug());
            if !fresh {
                tracing::debug!(slug = %c.slug, "duplicate candidate on listing; dropped");
            }
            fresh
        })
        .map(|mut c| {
            c.category = Some(category.to_owned());
            c
        })
        .collect()
}

fn write_candidates(path: &Path, candidates: &[ScrapedCandidate]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(candidates)?;
    std::fs::write(path, json + "\n")
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
    Ok(())
}

/// Print (or write) product URLs discovered through a sitemap.
///
/// # Errors
///
/// Returns an error if the top-level sitemap cannot be fetched or parsed, or
/// the output file cannot be written.
pub(crate) async fn run_sitemap(
    config: &AppConfig,
    url: &str,
    contains: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let fetcher = build_fetcher(config)?;
    let sitemap = sitemap_url_for(url);
    let urls = collect_product_urls(&fetcher, &sitemap, contains.unwrap_or("")).await?;

    match output {
        Some(path) => {
            let mut body = urls.join("\n");
            body.push('\n');
            std::fs::write(path, body)
                .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
            println!("{} URLs from {sitemap} written to {}", urls.len(), path.display());
        }
        None => {
            for u in &urls {
                println!("{u}");
            }
        }
    }
    Ok(())
}
