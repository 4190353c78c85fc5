//! Page fetch strategies
//!
//! - **Direct**: plain HTTP with a desktop browser User-Agent
//! - **Proxy**: a scraping proxy (ScraperAPI wire format) that deals with
//!   blocking and CAPTCHAs on our behalf
//! - **Rendered**: a headless browser session per fetch, for pages that only
//!   fill in their results with JavaScript

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::browser::BrowserLauncher;
use crate::config::{Config, FetchStrategy};
use crate::types::AppError;
use crate::utils::with_retry;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const FETCH_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("scraping proxy not configured (set SCRAPER_API_KEY)")]
    NoProxyKey,

    #[error("browser error: {0}")]
    Browser(String),
}

impl ScrapeError {
    /// Worth another attempt: transport failures, rate limiting and 5xx
    pub fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::Request(_) => true,
            ScrapeError::Status { status, .. } => *status == 429 || *status >= 500,
            ScrapeError::NoProxyKey | ScrapeError::Browser(_) => false,
        }
    }
}

impl From<ScrapeError> for AppError {
    fn from(e: ScrapeError) -> Self {
        match e {
            ScrapeError::NoProxyKey => AppError::Config(e.to_string()),
            other => AppError::Fetch(other.to_string()),
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its HTML
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .unwrap_or_else(|_| Client::new())
}

async fn get_text(client: &Client, url: &str, display_url: &str) -> Result<String, ScrapeError> {
    let response = client
        .get(url)
        .header("Accept-Language", "en-IN,en;q=0.9")
        .send()
        .await
        .map_err(|e| ScrapeError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Status {
            status: status.as_u16(),
            url: display_url.to_string(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| ScrapeError::Request(e.to_string()))
}

pub struct DirectFetcher {
    client: Client,
    retry_delay: Duration,
}

impl DirectFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            retry_delay: Duration::from_millis(500),
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

#[async_trait]
impl PageFetcher for DirectFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        debug!(url = %url, "Direct fetch");
        with_retry(
            || get_text(&self.client, url, url),
            FETCH_ATTEMPTS,
            self.retry_delay,
            ScrapeError::is_retryable,
        )
        .await
    }
}

pub struct ProxyFetcher {
    client: Client,
    api_key: String,
    api_base: String,
    retry_delay: Duration,
}

impl ProxyFetcher {
    pub fn new(api_key: String, api_base: String, timeout: Duration) -> Self {
        Self {
            // The proxy renders and retries upstream, give it room
            client: http_client(timeout * 4),
            api_key,
            api_base,
            retry_delay: Duration::from_millis(500),
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn proxied_url(&self, target: &str) -> Result<String, ScrapeError> {
        url::Url::parse_with_params(
            &self.api_base,
            &[("api_key", self.api_key.as_str()), ("url", target)],
        )
        .map(|u| u.to_string())
        .map_err(|e| ScrapeError::Request(format!("bad proxy base url: {}", e)))
    }
}

#[async_trait]
impl PageFetcher for ProxyFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let proxied = self.proxied_url(url)?;
        debug!(url = %url, "Proxy fetch");
        with_retry(
            || get_text(&self.client, &proxied, url),
            FETCH_ATTEMPTS,
            self.retry_delay,
            ScrapeError::is_retryable,
        )
        .await
    }
}

/// Stands in for the proxy when no key is configured, so the server still
/// starts and only scraped abilities report the missing key
pub struct MissingProxyKey;

#[async_trait]
impl PageFetcher for MissingProxyKey {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        debug!(url = %url, "Fetch refused, no proxy key");
        Err(ScrapeError::NoProxyKey)
    }
}

pub struct RenderedFetcher {
    launcher: Arc<dyn BrowserLauncher>,
    settle: Duration,
}

impl RenderedFetcher {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settle: Duration) -> Self {
        Self { launcher, settle }
    }
}

#[async_trait]
impl PageFetcher for RenderedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        debug!(url = %url, "Rendered fetch");
        let mut session = self
            .launcher
            .launch()
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;

        let html = async {
            session.goto(url).await?;
            tokio::time::sleep(self.settle).await;
            session.content().await
        }
        .await;

        // Closed on both paths; a close failure never masks the page
        if let Err(e) = session.close().await {
            debug!(error = %e, "Browser close failed after fetch");
        }
        html.map_err(|e| ScrapeError::Browser(e.to_string()))
    }
}

/// Build the fetcher selected by `SCRAPE_STRATEGY`
pub fn build_fetcher(config: &Config, launcher: Arc<dyn BrowserLauncher>) -> Arc<dyn PageFetcher> {
    let timeout = config.scraping.http_timeout();
    let fetcher: Arc<dyn PageFetcher> = match config.scraping.strategy {
        FetchStrategy::Direct => Arc::new(DirectFetcher::new(timeout)),
        FetchStrategy::Proxy => match config.scraping.proxy_api_key.clone() {
            Some(key) => Arc::new(ProxyFetcher::new(
                key,
                config.scraping.proxy_api_base.clone(),
                timeout,
            )),
            None => {
                warn!("SCRAPE_STRATEGY=proxy but SCRAPER_API_KEY is not set, scraped abilities will fail");
                Arc::new(MissingProxyKey)
            }
        },
        FetchStrategy::Rendered => Arc::new(RenderedFetcher::new(launcher, config.browser.settle())),
    };
    info!(strategy = ?config.scraping.strategy, "Page fetcher ready");
    fetcher
}
