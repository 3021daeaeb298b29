//! Page retrieval: static HTTP, rendered browser pages and search discovery.
//!
//! A [`Fetcher`] opens one [`FetchSession`] per collection run. The session
//! owns any browser it launched and must be closed by the caller; dropping it
//! releases the browser as a backstop.

pub mod browser;
pub mod http_client;
pub mod search;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Settings, SourceConfig};
use crate::models::{CollectionSource, SourceType};

pub use browser::BrowserSession;
pub use http_client::HttpClient;

/// Errors raised while retrieving pages.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("browser session could not be started: {0}")]
    SessionStartFailed(String),
    #[error("page did not become ready: {0}")]
    NavigationTimeout(String),
    #[error("browser error: {0}")]
    Browser(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::HttpStatus { status, .. } => http_client::is_transient_status(*status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::HttpStatus {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Opens per-run fetch sessions.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Prepare a session for one run over `source`.
    async fn open(
        &self,
        source: &CollectionSource,
        config: &SourceConfig,
    ) -> Result<Box<dyn FetchSession>, FetchError>;
}

/// A live session scoped to a single collection run.
#[async_trait]
pub trait FetchSession: Send {
    /// Retrieve the HTML of `url`, rendered or static as configured.
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError>;

    /// Load a search results page and return the result links in order.
    async fn discover_links(&mut self, search_url: &str) -> Result<Vec<String>, FetchError>;

    /// Download a binary resource such as an image.
    async fn fetch_bytes(&mut self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Release any resources held by the session.
    async fn close(&mut self);
}

/// Production fetcher backed by reqwest and chromiumoxide.
#[derive(Debug, Clone)]
pub struct DefaultFetcher {
    timeout: Duration,
    request_delay: Duration,
    max_retries: u32,
    user_agent: Option<String>,
}

impl DefaultFetcher {
    pub fn new(
        timeout: Duration,
        request_delay: Duration,
        max_retries: u32,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            timeout,
            request_delay,
            max_retries,
            user_agent,
        }
    }

    /// Build from application settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Duration::from_secs(settings.request_timeout),
            Duration::from_millis(settings.request_delay_ms),
            settings.max_retries,
            settings.user_agent.clone(),
        )
    }
}

#[async_trait]
impl Fetcher for DefaultFetcher {
    async fn open(
        &self,
        source: &CollectionSource,
        config: &SourceConfig,
    ) -> Result<Box<dyn FetchSession>, FetchError> {
        let http = HttpClient::with_user_agent(
            self.timeout,
            self.request_delay,
            self.max_retries,
            self.user_agent.as_deref(),
        )?;

        let browser = if config.use_selenium || source.is_search() {
            info!(
                "Starting {} session for source {}",
                config.selenium_config.browser.as_str(),
                source.id
            );
            Some(BrowserSession::launch(&config.selenium_config, http.user_agent()).await?)
        } else {
            None
        };

        Ok(Box::new(SourceSession {
            http,
            browser,
            config: config.clone(),
            video_only: source.source_type == SourceType::Video,
        }))
    }
}

/// Session that routes each request to the browser or the HTTP client.
pub struct SourceSession {
    http: HttpClient,
    browser: Option<BrowserSession>,
    config: SourceConfig,
    video_only: bool,
}

#[async_trait]
impl FetchSession for SourceSession {
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        match self.browser.as_mut() {
            Some(browser) if self.config.use_selenium => browser.render(url).await,
            _ => self.http.get_text(url).await,
        }
    }

    async fn discover_links(&mut self, search_url: &str) -> Result<Vec<String>, FetchError> {
        let browser = self.browser.as_mut().ok_or_else(|| {
            FetchError::SessionStartFailed("search discovery requires a browser".to_string())
        })?;

        let html = browser
            .discover(search_url, self.config.search_wait_selector.as_deref())
            .await?;
        let links = search::extract_result_links(
            &html,
            search_url,
            self.config.selectors.search_result_link.as_deref(),
            self.config.max_links,
            self.video_only,
        );
        debug!("Discovered {} links on {}", links.len(), search_url);
        Ok(links)
    }

    async fn fetch_bytes(&mut self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.http.get_bytes(url).await
    }

    async fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            browser.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Network("reset".into()).is_transient());
        assert!(FetchError::Timeout("slow".into()).is_transient());
        assert!(FetchError::HttpStatus {
            status: 502,
            url: "https://example.com".into()
        }
        .is_transient());
        assert!(!FetchError::HttpStatus {
            status: 404,
            url: "https://example.com".into()
        }
        .is_transient());
        assert!(!FetchError::NavigationTimeout("body".into()).is_transient());
    }

    #[tokio::test]
    async fn test_static_session_has_no_browser() {
        let fetcher = DefaultFetcher::new(Duration::from_secs(5), Duration::ZERO, 1, None);
        let source = CollectionSource::new(
            "s".into(),
            "Static".into(),
            "https://example.com/a".into(),
            SourceType::Webpage,
        );
        let mut session = fetcher
            .open(&source, &SourceConfig::default())
            .await
            .unwrap();
        let err = session
            .discover_links("https://example.com/search?q=x")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::SessionStartFailed(_)));
        session.close().await;
    }
}
