//! Product image downloads.
//!
//! Images are stored as `<images_dir>/<slug>.jpg`. A file that already exists
//! is never fetched again, so re-running a batch only touches what is missing.
//! Network requests are spaced by a fixed politeness delay; skipped items do
//! not consume a delay slot.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::client::{extract_domain, retry_after_secs};
use crate::error::ScraperError;
use crate::retry::{retry_with_backoff, Clock, RetryPolicy};

/// File name of a product's locally cached image.
#[must_use]
pub fn image_file_name(slug: &str) -> String {
    format!("{slug}.jpg")
}

/// Moves bytes from a URL into a file.
pub trait ImageTransport: Send + Sync {
    /// Fetches `url` into `dest` and returns the number of bytes written.
    ///
    /// Implementations must never leave a partial file at `dest`.
    fn fetch_to<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<u64, ScraperError>> + Send + 'a>>;
}

/// [`ImageTransport`] over HTTP.
///
/// Image CDNs commonly reject default client identifiers, so the client is
/// built with the configured browser `User-Agent`.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`ScraperError::Network`] if the client cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(1))
            .build()?;
        Ok(Self { client })
    }

    async fn stream_to_file(&self, url: &str, dest: &Path) -> Result<u64, ScraperError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScraperError::RateLimited {
                domain: extract_domain(url),
                retry_after_secs: retry_after_secs(response.headers()),
            });
        }
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let part = part_path(dest);
        let mut file = tokio::fs::File::create(&part)
            .await
            .map_err(|e| ScraperError::io(&part, e))?;

        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    discard(&part).await;
                    return Err(ScraperError::Network(e));
                }
            };
            if let Err(e) = file.write_all(&chunk).await {
                drop(file);
                discard(&part).await;
                return Err(ScraperError::io(&part, e));
            }
            written += chunk.len() as u64;
        }

        if let Err(e) = file.flush().await {
            drop(file);
            discard(&part).await;
            return Err(ScraperError::io(&part, e));
        }
        drop(file);

        tokio::fs::rename(&part, dest)
            .await
            .map_err(|e| ScraperError::io(dest, e))?;
        Ok(written)
    }
}

impl ImageTransport for HttpTransport {
    fn fetch_to<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<u64, ScraperError>> + Send + 'a>> {
        Box::pin(self.stream_to_file(url, dest))
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn discard(part: &Path) {
    if let Err(e) = tokio::fs::remove_file(part).await {
        tracing::debug!(path = %part.display(), error = %e, "could not remove partial download");
    }
}

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub images_dir: PathBuf,
    /// Pause between consecutive network requests.
    pub delay: Duration,
    /// Maximum requests in flight. `1` downloads strictly one at a time.
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

/// One image to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub slug: String,
    pub url: String,
}

#[derive(Debug)]
pub enum DownloadOutcome {
    /// The target file already existed; no request was made.
    Skipped,
    /// Bytes written.
    Downloaded(u64),
    Failed(ScraperError),
}

#[derive(Debug, Default)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Per-slug outcomes in job order.
    pub outcomes: Vec<(String, DownloadOutcome)>,
}

impl DownloadReport {
    fn record(&mut self, slug: String, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Skipped => self.skipped += 1,
            DownloadOutcome::Downloaded(_) => self.downloaded += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
        self.outcomes.push((slug, outcome));
    }

    /// Whether the image for `slug` is on disk after the run.
    #[must_use]
    pub fn is_present(&self, slug: &str) -> bool {
        self.outcomes.iter().any(|(s, outcome)| {
            s == slug
                && matches!(
                    outcome,
                    DownloadOutcome::Skipped | DownloadOutcome::Downloaded(_)
                )
        })
    }
}

enum Step<'a> {
    Present(&'a DownloadJob),
    Fetch(&'a DownloadJob, PathBuf),
}

pub struct AssetDownloader {
    transport: Arc<dyn ImageTransport>,
    clock: Arc<dyn Clock>,
    options: DownloadOptions,
}

impl AssetDownloader {
    #[must_use]
    pub fn new(
        transport: Arc<dyn ImageTransport>,
        clock: Arc<dyn Clock>,
        options: DownloadOptions,
    ) -> Self {
        Self {
            transport,
            clock,
            options,
        }
    }

    /// Local path the image for `slug` is stored at.
    #[must_use]
    pub fn destination(&self, slug: &str) -> PathBuf {
        self.options.images_dir.join(image_file_name(slug))
    }

    /// Downloads a single image unless it is already present.
    ///
    /// Never applies the politeness delay; use [`Self::download_all`] for
    /// batches.
    pub async fn download(&self, url: &str, slug: &str) -> DownloadOutcome {
        if let Err(e) = self.ensure_images_dir().await {
            return DownloadOutcome::Failed(e);
        }
        let dest = self.destination(slug);
        if is_present(&dest).await {
            tracing::debug!(slug, "image already present, skipping");
            return DownloadOutcome::Skipped;
        }
        self.fetch(url, slug, &dest).await
    }

    /// Downloads every job's image, pacing network requests by the
    /// configured delay and keeping at most `concurrency` in flight.
    ///
    /// Per-item failures are recorded in the report and never abort the
    /// batch.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Io`] if the image directory cannot be created.
    pub async fn download_all(&self, jobs: &[DownloadJob]) -> Result<DownloadReport, ScraperError> {
        self.ensure_images_dir().await?;

        let issued = AtomicBool::new(false);
        let issued = &issued;

        let results: Vec<(String, DownloadOutcome)> = stream::iter(jobs)
            .then(|job| async move {
                let dest = self.destination(&job.slug);
                if is_present(&dest).await {
                    return Step::Present(job);
                }
                if issued.swap(true, Ordering::SeqCst) {
                    self.clock.sleep(self.options.delay).await;
                }
                Step::Fetch(job, dest)
            })
            .map(|step| async move {
                match step {
                    Step::Present(job) => {
                        tracing::debug!(slug = %job.slug, "image already present, skipping");
                        (job.slug.clone(), DownloadOutcome::Skipped)
                    }
                    Step::Fetch(job, dest) => {
                        let outcome = self.fetch(&job.url, &job.slug, &dest).await;
                        (job.slug.clone(), outcome)
                    }
                }
            })
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut report = DownloadReport::default();
        for (slug, outcome) in results {
            report.record(slug, outcome);
        }

        tracing::info!(
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = report.failed,
            "image download batch complete"
        );
        Ok(report)
    }

    async fn fetch(&self, url: &str, slug: &str, dest: &Path) -> DownloadOutcome {
        let result = retry_with_backoff(self.options.retry, self.clock.as_ref(), || {
            self.transport.fetch_to(url, dest)
        })
        .await;

        match result {
            Ok(bytes) => {
                tracing::info!(slug, url, bytes, "downloaded image");
                DownloadOutcome::Downloaded(bytes)
            }
            Err(e) => {
                tracing::warn!(slug, url, error = %e, "image download failed");
                DownloadOutcome::Failed(e)
            }
        }
    }

    async fn ensure_images_dir(&self) -> Result<(), ScraperError> {
        tokio::fs::create_dir_all(&self.options.images_dir)
            .await
            .map_err(|e| ScraperError::io(&self.options.images_dir, e))
    }
}

async fn is_present(dest: &Path) -> bool {
    tokio::fs::try_exists(dest).await.unwrap_or(false)
}

#[cfg(test)]
#[path = "download_test.rs"]
mod tests;
