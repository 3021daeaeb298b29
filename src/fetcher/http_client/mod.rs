//! HTTP client with courtesy delay and retry on transient failures.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use super::FetchError;

/// Sent when no user agent is configured. Some sites serve stripped pages to
/// obvious bots, so this reads as a desktop browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// HTTP client used for static fetches and image downloads.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
    request_delay: Duration,
    max_retries: u32,
}

impl HttpClient {
    /// Build a client that sends `user_agent`, or [`DEFAULT_USER_AGENT`] when
    /// it is unset or blank.
    pub fn with_user_agent(
        timeout: Duration,
        request_delay: Duration,
        max_retries: u32,
        user_agent: Option<&str>,
    ) -> Result<Self, FetchError> {
        let user_agent = user_agent
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT)
            .to_string();
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            user_agent,
            request_delay,
            max_retries: max_retries.max(1),
        })
    }

    /// The user agent actually sent.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Get page content as text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        response.text().await.map_err(FetchError::from)
    }

    /// Get a binary body (images).
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.get(url).await?;
        let bytes = response.bytes().await.map_err(FetchError::from)?;
        Ok(bytes.to_vec())
    }

    /// GET with retries on transient failures.
    ///
    /// Backoff is linear: the n-th retry waits `request_delay * n`.
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let mut attempt = 1;
        loop {
            match self.get_once(url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let backoff = self.request_delay * attempt;
                    warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt, self.max_retries, url, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// A single GET followed by the courtesy delay.
    async fn get_once(&self, url: &str) -> Result<Response, FetchError> {
        debug!("GET {}", url);
        let result = self.client.get(url).send().await;

        // Apply base delay whether or not the request succeeded
        tokio::time::sleep(self.request_delay).await;

        let response = result.map_err(FetchError::from)?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }
}

/// Whether an HTTP status is worth retrying.
pub fn is_transient_status(status: u16) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS.as_u16()
        || status == StatusCode::REQUEST_TIMEOUT.as_u16()
        || (500..600).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(429));
        assert!(is_transient_status(503));
        assert!(is_transient_status(408));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(403));
    }

    #[test]
    fn test_client_resolves_user_agent() {
        let client = HttpClient::with_user_agent(
            Duration::from_secs(5),
            Duration::ZERO,
            0,
            Some("TestAgent/1.0"),
        )
        .unwrap();
        assert_eq!(client.user_agent(), "TestAgent/1.0");
        assert_eq!(client.max_retries, 1);
    }

    #[test]
    fn test_blank_user_agent_falls_back_to_default() {
        for configured in [None, Some(""), Some("   ")] {
            let client =
                HttpClient::with_user_agent(Duration::from_secs(5), Duration::ZERO, 1, configured)
                    .unwrap();
            assert_eq!(client.user_agent(), DEFAULT_USER_AGENT);
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 9 (discard) on localhost is essentially never listening.
        let client =
            HttpClient::with_user_agent(Duration::from_secs(2), Duration::ZERO, 2, None).unwrap();
        let err = client.get_text("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_) | FetchError::Timeout(_)));
    }
}
