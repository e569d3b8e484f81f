use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{redirect, Client};

use crate::error::ScraperError;
use crate::retry::{retry_with_backoff, Clock, RetryPolicy, TokioClock};

/// A fetched HTML or XML document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against this.
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can turn a URL into a document: plain HTTP, or a headless
/// browser for script-rendered listings.
pub trait PageSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedPage, ScraperError>> + Send + 'a>>;
}

/// HTTP client for source-site listing pages and sitemaps.
///
/// Redirects are followed transparently, but only a single hop; longer
/// chains surface as [`ScraperError::Redirect`] for the caller to resolve.
/// HTTP 429 becomes [`ScraperError::RateLimited`], any other non-2xx status
/// becomes [`ScraperError::UnexpectedStatus`].
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

/// Extracts the scheme+host origin from a URL.
///
/// Given `"https://www.mondokart.com/en/brakes/"`, returns
/// `"https://www.mondokart.com"`.
pub(crate) fn extract_origin(url: &str) -> String {
    reqwest::Url::parse(url).map_or_else(
        |_| {
            url.trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Seconds from a numeric `Retry-After` header; 60 when absent or not a
/// plain number.
pub(crate) fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(60)
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if there is no scheme.
pub(crate) fn extract_domain(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(url)
        .to_owned()
}

/// Resolves `candidate` (absolute, root-relative or relative) against `base`.
///
/// Returns `None` for empty values, fragments and `javascript:`/`mailto:` links.
#[must_use]
pub fn absolutize_url(base: &str, candidate: &str) -> Option<String> {
    let candidate = candidate.trim().replace("&amp;", "&");
    if candidate.is_empty()
        || candidate.starts_with('#')
        || candidate.starts_with("javascript:")
        || candidate.starts_with("mailto:")
    {
        return None;
    }
    let base = reqwest::Url::parse(base).ok()?;
    base.join(&candidate).ok().map(|u| u.to_string())
}

impl HttpFetcher {
    /// Creates an `HttpFetcher` with the configured timeout, `User-Agent`
    /// and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Network`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        retry: RetryPolicy,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .redirect(redirect::Policy::limited(1))
            .build()?;
        Ok(Self {
            client,
            retry,
            clock: Arc::new(TokioClock),
        })
    }

    /// Replaces the clock used for retry backoff.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Fetches `url` and returns the body with its final URL and status.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Network`]: connection, TLS or timeout failure.
    /// - [`ScraperError::Redirect`]: more than one redirect hop.
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        retry_with_backoff(self.retry, self.clock.as_ref(), || async move {
            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) if e.is_redirect() => {
                    return Err(ScraperError::Redirect {
                        url: url.to_owned(),
                    })
                }
                Err(e) => return Err(ScraperError::Network(e)),
            };
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

            let final_url = response.url().to_string();
            let body = response.text().await?;
            Ok(FetchedPage {
                url: final_url,
                status: status.as_u16(),
                body,
            })
        })
        .await
    }
}

impl PageSource for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedPage, ScraperError>> + Send + 'a>> {
        Box::pin(self.fetch_page(url))
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
