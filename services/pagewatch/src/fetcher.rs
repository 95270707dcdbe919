//! Content fetching: one HTTP GET plus element extraction per cycle

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::extract::ElementSelector;
use crate::io::HttpClient;

/// Result of fetching the watched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Ok(String),
    NotFound,
    TransportError(String),
}

/// What to fetch and how long to wait for it
#[derive(Debug, Clone)]
pub struct Target {
    pub url: String,
    pub selector: ElementSelector,
    pub request_timeout: Duration,
}

impl Target {
    pub fn element_id(&self) -> &str {
        self.selector.element_id()
    }
}

/// Trait for fetching the watched element. Never fails: problems are folded into the result.
#[async_trait]
pub trait ContentFetcher: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, target: &Target) -> FetchResult;
}

/// Fetches pages over HTTP and extracts the element with scraper
pub struct PageFetcher {
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher").finish_non_exhaustive()
    }
}

impl PageFetcher {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ContentFetcher for PageFetcher {
    async fn fetch(&self, target: &Target) -> FetchResult {
        tracing::debug!(
            "Fetching element '{}' from {}",
            target.element_id(),
            target.url
        );

        // The client is asked to honour the timeout too; this bound holds for any HttpClient.
        let request = self.http.get(&target.url, target.request_timeout);
        let response = match tokio::time::timeout(target.request_timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::debug!("Fetch of {} failed: {}", target.url, e);
                return FetchResult::TransportError(e.to_string());
            }
            Err(_) => {
                tracing::debug!("Fetch of {} timed out", target.url);
                return FetchResult::TransportError(
                    crate::PageWatchError::Timeout(target.request_timeout).to_string(),
                );
            }
        };

        if !response.is_success() {
            return FetchResult::TransportError(format!(
                "GET {} returned HTTP status {}",
                target.url, response.status
            ));
        }

        match target.selector.extract(&response.body) {
            Some(content) => {
                tracing::debug!(
                    "Found element '{}' ({} bytes)",
                    target.element_id(),
                    content.len()
                );
                FetchResult::Ok(content)
            }
            None => {
                tracing::warn!(
                    "Element '{}' not found in content from {}",
                    target.element_id(),
                    target.url
                );
                FetchResult::NotFound
            }
        }
    }
}
