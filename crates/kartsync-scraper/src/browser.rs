//! Headless-browser page source for listings rendered by JavaScript.
//!
//! Enabled with the `browser` cargo feature. The browser process is launched
//! once per run and every fetch opens a fresh tab.

use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::client::{FetchedPage, PageSource};
use crate::error::ScraperError;

/// How often the rendered DOM is sampled while waiting for network idle.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The DOM is considered settled once its length is unchanged for this many
/// consecutive polls.
const STABLE_POLLS_REQUIRED: u32 = 2;

pub struct BrowserFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    idle_timeout: Duration,
}

impl BrowserFetcher {
    /// Launches a headless Chromium. `CHROMIUM_PATH` overrides executable
    /// discovery.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the browser cannot be configured
    /// or started.
    pub async fn launch(user_agent: &str, idle_timeout: Duration) -> Result<Self, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(30))
            .window_size(1920, 1080)
            .arg(format!("--user-agent={user_agent}"));
        if let Ok(path) = std::env::var("CHROMIUM_PATH") {
            builder = builder.chrome_executable(PathBuf::from(path));
        }
        let config = builder.build().map_err(ScraperError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser handler event error");
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            idle_timeout,
        })
    }

    /// Navigates to `url`, waits for the load and for the DOM to settle, and
    /// returns the rendered markup. The tab is closed whether or not the
    /// render succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] on navigation failure.
    pub async fn render(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| ScraperError::Browser(format!("navigate to {url}: {e}")))?;
        let result = self.read_settled(&page, url).await;
        close_tab(url, result, page.close()).await
    }

    async fn read_settled(&self, page: &Page, url: &str) -> Result<FetchedPage, ScraperError> {
        page.wait_for_navigation()
            .await
            .map_err(|e| ScraperError::Browser(format!("wait for {url}: {e}")))?;

        let start = Instant::now();
        let mut last_len = 0usize;
        let mut stable_polls = 0u32;
        let mut html = String::new();
        while stable_polls < STABLE_POLLS_REQUIRED && start.elapsed() < self.idle_timeout {
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
            html = page
                .content()
                .await
                .map_err(|e| ScraperError::Browser(format!("read DOM of {url}: {e}")))?;
            if html.len() == last_len {
                stable_polls += 1;
            } else {
                stable_polls = 0;
                last_len = html.len();
            }
        }
        if stable_polls < STABLE_POLLS_REQUIRED {
            tracing::warn!(url, "page did not settle before idle timeout; using current DOM");
        }

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_owned());
        Ok(FetchedPage {
            url: final_url,
            status: 200,
            body: html,
        })
    }

    /// Closes the browser and waits for its event handler to finish.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "failed to close browser");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }
}

impl PageSource for BrowserFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedPage, ScraperError>> + Send + 'a>> {
        Box::pin(self.render(url))
    }
}

/// Awaits the tab close and hands back the render result unchanged. A close
/// failure is only logged.
async fn close_tab<T, E: Display>(
    url: &str,
    result: Result<T, ScraperError>,
    close: impl Future<Output = Result<(), E>>,
) -> Result<T, ScraperError> {
    if let Err(e) = close.await {
        tracing::debug!(url, error = %e, "failed to close browser tab");
    }
    result
}
