//! Semaphore-gated HTTP image fetcher.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

use crate::domain::ports::{ImageFetchPort, LoadError, LoadResult};

/// Default bound on concurrent image downloads.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Downloads image bytes over HTTP.
///
/// A semaphore bounds concurrent requests so that batch preloads and many
/// simultaneously visible cards cannot fan out without limit; callers
/// above this layer are unaware of the gate.
pub struct HttpImageFetcher {
    client: reqwest::Client,
    permits: Arc<Semaphore>,
}

impl HttpImageFetcher {
    /// Creates a fetcher with default limits.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> LoadResult<Self> {
        Self::with_limits(DEFAULT_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENT_DOWNLOADS)
    }

    /// Creates a fetcher with an explicit timeout and concurrency bound.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_limits(timeout_secs: u64, max_concurrent: usize) -> LoadResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("galleria/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LoadError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        })
    }

    /// Permits currently available.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl ImageFetchPort for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> LoadResult<Bytes> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| LoadError::Network("fetcher is shutting down".to_string()))?;

        trace!(url, "downloading image");
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                LoadError::Network("request timed out".to_string())
            } else {
                LoadError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::Network(format!("failed to read body: {e}")))?;

        debug!(url, size = bytes.len(), "image downloaded");
        Ok(bytes)
    }
}

impl std::fmt::Debug for HttpImageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpImageFetcher")
            .field("available_permits", &self.available_permits())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_sets_the_concurrency_bound() {
        let fetcher = HttpImageFetcher::with_limits(5, 2).unwrap();
        assert_eq!(fetcher.available_permits(), 2);
    }

    #[test]
    fn zero_concurrency_is_clamped_to_one() {
        let fetcher = HttpImageFetcher::with_limits(5, 0).unwrap();
        assert_eq!(fetcher.available_permits(), 1);
    }
}
