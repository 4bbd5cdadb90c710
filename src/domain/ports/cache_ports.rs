//! Port definitions for the preload cache and the decoded-image cache.

use std::sync::Arc;

use async_trait::async_trait;

use super::image_fetch_port::LoadResult;
use crate::domain::entities::CacheKey;

/// Port for the persistent, URL-keyed preload cache.
///
/// The cache stores raw image bytes. It is shared and append-only from
/// the loading subsystem's perspective; any eviction policy belongs to
/// the implementation.
#[async_trait]
pub trait PreloadCachePort: Send + Sync {
    /// Returns the cached bytes for `url`, if present.
    async fn get(&self, url: &str) -> Option<Vec<u8>>;

    /// Stores bytes under `url`.
    async fn put(&self, url: &str, bytes: &[u8]) -> LoadResult<()>;

    /// Returns true if `url` is cached.
    async fn contains(&self, url: &str) -> bool;

    /// Removes the entry for `url`, if present.
    async fn evict(&self, url: &str);

    /// Removes every entry.
    async fn clear(&self) -> LoadResult<()>;

    /// Number of cached entries.
    async fn len(&self) -> usize;

    /// Returns true if the cache holds no entries.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Port for the in-memory decoded-image cache.
/// Implementations must be thread-safe.
#[async_trait]
pub trait ImageCachePort: Send + Sync {
    /// Attempts to get a decoded image from the cache.
    async fn get(&self, key: &CacheKey) -> Option<Arc<image::DynamicImage>>;

    /// Stores a decoded image in the cache.
    async fn put(&self, key: CacheKey, image: Arc<image::DynamicImage>);

    /// Removes an image from the cache.
    async fn evict(&self, key: &CacheKey);

    /// Returns the current number of cached images.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all images from the cache.
    async fn clear(&self);
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::super::image_fetch_port::LoadError;
    use super::*;

    /// Hash-map preload cache for tests.
    #[derive(Default)]
    pub struct MapPreloadCache {
        entries: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MapPreloadCache {
        /// Creates an empty cache.
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl PreloadCachePort for MapPreloadCache {
        async fn get(&self, url: &str) -> Option<Vec<u8>> {
            self.entries.lock().get(url).cloned()
        }

        async fn put(&self, url: &str, bytes: &[u8]) -> LoadResult<()> {
            self.entries.lock().insert(url.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn contains(&self, url: &str) -> bool {
            self.entries.lock().contains_key(url)
        }

        async fn evict(&self, url: &str) {
            self.entries.lock().remove(url);
        }

        async fn clear(&self) -> LoadResult<()> {
            self.entries.lock().clear();
            Ok(())
        }

        async fn len(&self) -> usize {
            self.entries.lock().len()
        }
    }

    /// Preload cache whose writes always fail; reads always miss.
    pub struct BrokenPreloadCache;

    #[async_trait]
    impl PreloadCachePort for BrokenPreloadCache {
        async fn get(&self, _url: &str) -> Option<Vec<u8>> {
            None
        }

        async fn put(&self, _url: &str, _bytes: &[u8]) -> LoadResult<()> {
            Err(LoadError::Io("mock write failure".to_string()))
        }

        async fn contains(&self, _url: &str) -> bool {
            false
        }

        async fn evict(&self, _url: &str) {}

        async fn clear(&self) -> LoadResult<()> {
            Ok(())
        }

        async fn len(&self) -> usize {
            0
        }
    }
}
