//! HTTP client for the disclosure site.

mod user_agent;

pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder};
use tracing::debug;

use super::error::ScrapeError;

/// HTTP client with a fixed politeness delay after every request.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_delay: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(timeout: Duration, request_delay: Duration) -> Result<Self, ScrapeError> {
        Self::with_user_agent(timeout, request_delay, None)
    }

    /// Create a new HTTP client with custom user agent configuration.
    /// - None: Use default part335 user agent
    /// - Some("impersonate"): Use random real browser user agent
    /// - Some(custom): Use custom user agent string
    pub fn with_user_agent(
        timeout: Duration,
        request_delay: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, ScrapeError> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            request_delay,
        })
    }

    /// GET a page and return its body. Non-success statuses are errors.
    pub async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        self.send("GET", url, self.client.get(url)).await
    }

    /// POST url-encoded form fields and return the response body.
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<String, ScrapeError> {
        self.send("POST", url, self.client.post(url).form(fields))
            .await
    }

    async fn send(
        &self,
        method: &str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<String, ScrapeError> {
        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        debug!(
            "{} {} -> {} in {}ms",
            method,
            url,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        tokio::time::sleep(self.request_delay).await;

        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_each_user_agent_mode() {
        for mode in [None, Some("impersonate"), Some("part335-test/1.0")] {
            assert!(HttpClient::with_user_agent(
                Duration::from_secs(5),
                Duration::from_millis(0),
                mode
            )
            .is_ok());
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        let client = HttpClient::new(Duration::from_secs(2), Duration::from_millis(0)).unwrap();
        let err = client.get_text("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Http(_)));
    }
}
