//! Rendered page retrieval through a Chromium-family browser (CDP).
//!
//! A [`BrowserSession`] is launched once per run and reused for every URL of
//! that run. Callers close it explicitly; `Drop` stops the CDP handler as a
//! backstop so an aborted run never leaves the event loop behind.

#![cfg_attr(not(feature = "browser"), allow(dead_code))]

use std::path::PathBuf;
#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;

use super::FetchError;
use crate::config::{BrowserKind, RenderConfig};
#[cfg(feature = "browser")]
use super::search::SEARCH_FALLBACK_SELECTORS;

/// Chrome/Chromium locations checked before `PATH`.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/google/chrome/google-chrome",
];

const CHROME_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

const EDGE_PATHS: &[&str] = &[
    "/usr/bin/microsoft-edge",
    "/usr/bin/microsoft-edge-stable",
    "/opt/microsoft/msedge/msedge",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

const EDGE_COMMANDS: &[&str] = &["microsoft-edge", "microsoft-edge-stable", "msedge"];

#[cfg(feature = "browser")]
const READY_STATE_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete') {
            resolve(document.readyState);
        } else {
            window.addEventListener('load', () => resolve(document.readyState));
        }
    })
"#;

#[cfg(feature = "browser")]
const SCROLL_BOTTOM_SCRIPT: &str =
    "window.scrollTo(0, document.body.scrollHeight); document.body.scrollHeight";

#[cfg(feature = "browser")]
const MAX_SCROLLS: usize = 3;

#[cfg(feature = "browser")]
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Settle time after a search page reports its results container.
#[cfg(feature = "browser")]
const SEARCH_SETTLE: Duration = Duration::from_secs(3);

/// Locate the browser executable for `kind`.
///
/// An explicit `driver_path` always wins. Firefox has no CDP driver here, so
/// it needs an explicit path to a compatible executable.
pub fn find_executable(
    kind: BrowserKind,
    driver_path: Option<&PathBuf>,
) -> Result<PathBuf, FetchError> {
    if let Some(path) = driver_path {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(FetchError::SessionStartFailed(format!(
            "configured driver_path does not exist: {}",
            path.display()
        )));
    }

    let (paths, commands) = match kind {
        BrowserKind::Chrome => (CHROME_PATHS, CHROME_COMMANDS),
        BrowserKind::Edge => (EDGE_PATHS, EDGE_COMMANDS),
        BrowserKind::Firefox => {
            return Err(FetchError::SessionStartFailed(
                "firefox requires selenium_config.driver_path pointing at a CDP-capable executable"
                    .to_string(),
            ))
        }
    };

    for path in paths {
        let p = std::path::Path::new(path);
        if p.exists() {
            return Ok(p.to_path_buf());
        }
    }
    for cmd in commands {
        if let Ok(path) = which::which(cmd) {
            return Ok(path);
        }
    }

    Err(FetchError::SessionStartFailed(format!(
        "{} executable not found; install it or set selenium_config.driver_path",
        kind.as_str()
    )))
}

/// A launched browser plus its CDP event loop.
#[cfg(feature = "browser")]
pub struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    config: RenderConfig,
    user_agent: String,
}

#[cfg(feature = "browser")]
impl BrowserSession {
    /// Launch a browser configured by `config`.
    pub async fn launch(config: &RenderConfig, user_agent: &str) -> Result<Self, FetchError> {
        let executable = find_executable(config.browser, config.driver_path.as_ref())?;
        info!(
            "Launching {} at {} (headless={})",
            config.browser.as_str(),
            executable.display(),
            config.headless
        );

        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .request_timeout(Duration::from_secs(config.wait_timeout));

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        let browser_config = builder
            .build()
            .map_err(|e| FetchError::SessionStartFailed(format!("browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::SessionStartFailed(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser: Some(browser),
            handler,
            config: config.clone(),
            user_agent: user_agent.to_string(),
        })
    }

    fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.config.wait_timeout)
    }

    /// Open a fresh tab and navigate to `url`.
    async fn open_page(&self, url: &str) -> Result<Page, FetchError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| FetchError::Browser("browser session already closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;
        page.execute(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        info!("Navigating to {}", url);
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        match tokio::time::timeout(self.wait_timeout(), page.execute(nav_params)).await {
            Ok(Ok(_)) => Ok(page),
            Ok(Err(e)) => {
                let _ = page.close().await;
                Err(FetchError::Browser(e.to_string()))
            }
            Err(_) => {
                let _ = page.close().await;
                Err(FetchError::NavigationTimeout(format!("navigation to {url}")))
            }
        }
    }

    /// Render `url` and return the HTML after the readiness sequence.
    pub async fn render(&mut self, url: &str) -> Result<String, FetchError> {
        let page = self.open_page(url).await?;
        let result = self.render_page(&page, url).await;
        let _ = page.close().await;
        result
    }

    async fn render_page(&self, page: &Page, url: &str) -> Result<String, FetchError> {
        let timeout = self.wait_timeout();

        match tokio::time::timeout(timeout, page.evaluate(READY_STATE_SCRIPT.to_string())).await {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
            }
            Ok(Err(e)) => debug!("Could not check ready state: {}", e),
            Err(_) => warn!("Timeout waiting for document.readyState on {}", url),
        }

        if !wait_for_any(page, &["body"], timeout).await {
            return Err(FetchError::NavigationTimeout(format!("no <body> on {url}")));
        }

        let wait_selectors = self.config.content_wait_selectors();
        if !wait_selectors.is_empty() {
            if wait_for_any(page, &wait_selectors, timeout).await {
                debug!("Content selector present on {}", url);
            } else {
                warn!(
                    "Timeout waiting for content selector {:?} on {}",
                    self.config.content_wait_selector, url
                );
            }
        }

        if self.config.scroll_to_load {
            scroll_to_load(page).await;
        }

        if self.config.extra_wait_time > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(self.config.extra_wait_time)).await;
        }

        page.content()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))
    }

    /// Load a search results page and return its HTML once results appear.
    pub async fn discover(
        &mut self,
        search_url: &str,
        wait_selector: Option<&str>,
    ) -> Result<String, FetchError> {
        let page = self.open_page(search_url).await?;

        let selectors: Vec<&str> = match wait_selector.map(str::trim).filter(|s| !s.is_empty()) {
            Some(selector) => vec![selector],
            None => SEARCH_FALLBACK_SELECTORS.to_vec(),
        };
        if !wait_for_any(&page, &selectors, self.wait_timeout()).await {
            warn!("No search results container appeared on {}", search_url);
        }
        tokio::time::sleep(SEARCH_SETTLE).await;

        let result = page
            .content()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()));
        let _ = page.close().await;
        result
    }

    /// Shut the browser down and wait for the process to exit.
    pub async fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                debug!("Browser close failed: {}", e);
            }
            let _ = browser.wait().await;
        }
        self.handler.abort();
    }
}

#[cfg(feature = "browser")]
impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Poll until any selector matches; the first match wins.
#[cfg(feature = "browser")]
async fn wait_for_any(page: &Page, selectors: &[&str], timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        for selector in selectors {
            if page.find_element(*selector).await.is_ok() {
                debug!("Selector matched: {}", selector);
                return true;
            }
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Scroll to the bottom until the page stops growing, then back to the top.
#[cfg(feature = "browser")]
async fn scroll_to_load(page: &Page) {
    let mut last_height = page_height(page).await;
    for _ in 0..MAX_SCROLLS {
        if let Err(e) = page.evaluate(SCROLL_BOTTOM_SCRIPT.to_string()).await {
            debug!("Scroll failed: {}", e);
            break;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        let height = page_height(page).await;
        if height <= last_height {
            break;
        }
        last_height = height;
    }
    let _ = page.evaluate("window.scrollTo(0, 0)".to_string()).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
}

#[cfg(feature = "browser")]
async fn page_height(page: &Page) -> f64 {
    match page.evaluate("document.body.scrollHeight".to_string()).await {
        Ok(result) => result.into_value::<f64>().unwrap_or(0.0),
        Err(_) => 0.0,
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct BrowserSession;

#[cfg(not(feature = "browser"))]
impl BrowserSession {
    pub async fn launch(config: &RenderConfig, _user_agent: &str) -> Result<Self, FetchError> {
        find_executable(config.browser, config.driver_path.as_ref())?;
        Err(FetchError::SessionStartFailed(
            "browser support not compiled; rebuild with --features browser".to_string(),
        ))
    }

    pub async fn render(&mut self, _url: &str) -> Result<String, FetchError> {
        Err(FetchError::SessionStartFailed(
            "browser support not compiled".to_string(),
        ))
    }

    pub async fn discover(
        &mut self,
        _search_url: &str,
        _wait_selector: Option<&str>,
    ) -> Result<String, FetchError> {
        Err(FetchError::SessionStartFailed(
            "browser support not compiled".to_string(),
        ))
    }

    pub async fn close(&mut self) {}
}
