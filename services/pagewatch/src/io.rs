//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;

const USER_AGENT: &str = concat!("pagewatch/", env!("CARGO_PKG_VERSION"));

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request, giving up if the full response has not arrived within `timeout`
    async fn get(&self, url: &str, timeout: Duration) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| crate::PageWatchError::Http(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, timeout: Duration) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    crate::PageWatchError::Timeout(timeout)
                } else {
                    crate::PageWatchError::Http(format!("GET {} failed: {}", url, e))
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                crate::PageWatchError::Timeout(timeout)
            } else {
                crate::PageWatchError::Http(format!("Reading response body: {}", e))
            }
        })?;

        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}
