//! Port definition for fetching image bytes.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Result type for load and cache operations.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Errors that can occur while loading or caching an image.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// Network failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),
    /// The bytes could not be decoded as an image.
    #[error("decode error: {0}")]
    Decode(String),
    /// I/O failure in a cache store.
    #[error("cache io error: {0}")]
    Io(String),
}

/// Port for downloading raw image bytes.
///
/// Implementations own their own concurrency policy; callers treat every
/// `fetch` as an independent request.
#[async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Fetches the body at `url`.
    async fn fetch(&self, url: &str) -> LoadResult<Bytes>;
}
