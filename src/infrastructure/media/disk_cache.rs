//! Persistent, URL-keyed preload cache on disk.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use crate::domain::entities::CacheKey;
use crate::infrastructure::config::project_dirs;
use crate::domain::ports::{LoadError, LoadResult, PreloadCachePort};

/// Default maximum cache size in bytes (200 MB).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 200 * 1024 * 1024;

const CACHE_EXT: &str = "img";

/// Disk cache persisting raw image bytes across sessions.
///
/// Entries are keyed by the digest of their URL. The cache sweeps
/// least-recently-accessed entries once it grows past its size limit;
/// callers treat it as append-only.
pub struct DiskPreloadCache {
    cache_dir: PathBuf,
    max_size: u64,
    current_size: AtomicU64,
    item_count: AtomicUsize,
}

impl DiskPreloadCache {
    /// Opens a cache in the given directory, creating it if needed.
    ///
    /// # Errors
    /// Returns an error if the cache directory cannot be created or read.
    pub async fn new(cache_dir: PathBuf, max_size: u64) -> LoadResult<Self> {
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| LoadError::Io(format!("failed to create cache dir: {e}")))?;

        let mut total_size = 0u64;
        let mut count = 0usize;
        let mut entries = fs::read_dir(&cache_dir)
            .await
            .map_err(|e| LoadError::Io(format!("failed to read cache dir: {e}")))?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == CACHE_EXT)
                && let Ok(meta) = entry.metadata().await
            {
                total_size += meta.len();
                count += 1;
            }
        }

        let cache = Self {
            cache_dir,
            max_size,
            current_size: AtomicU64::new(total_size),
            item_count: AtomicUsize::new(count),
        };
        cache.sweep_if_needed().await;
        Ok(cache)
    }

    /// Opens the cache in its default location.
    ///
    /// # Errors
    /// Returns an error if the cache directory cannot be created.
    pub async fn default_location(max_size: u64) -> LoadResult<Self> {
        Self::new(default_cache_dir(), max_size).await
    }

    /// Current cache size in bytes.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let key = CacheKey::from_url(url);
        self.cache_dir.join(format!("{}.{CACHE_EXT}", key.as_str()))
    }

    /// Evicts least-recently-accessed entries once over the size limit,
    /// freeing an extra tenth of the limit as headroom.
    async fn sweep_if_needed(&self) {
        let current_size = self.current_size();
        if current_size <= self.max_size {
            return;
        }

        debug!(current_size, max_size = self.max_size, "preload cache over limit");

        let Ok(mut entries) = fs::read_dir(&self.cache_dir).await else {
            return;
        };

        let mut files: Vec<(PathBuf, std::time::SystemTime, u64)> = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != CACHE_EXT) {
                continue;
            }
            if let Ok(meta) = entry.metadata().await {
                let accessed = meta.accessed().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                files.push((path, accessed, meta.len()));
            }
        }
        files.sort_by_key(|(_, accessed, _)| *accessed);

        let target = current_size - self.max_size + (self.max_size / 10);
        let mut freed_size = 0u64;
        let mut freed_count = 0usize;

        for (path, _, size) in files {
            if freed_size >= target {
                break;
            }
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "failed to sweep cache entry");
            } else {
                freed_size += size;
                freed_count += 1;
            }
        }

        self.current_size.fetch_sub(freed_size, Ordering::Relaxed);
        self.item_count.fetch_sub(freed_count, Ordering::Relaxed);
        debug!(freed_size, freed_count, "preload cache sweep complete");
    }
}

#[async_trait]
impl PreloadCachePort for DiskPreloadCache {
    async fn get(&self, url: &str) -> Option<Vec<u8>> {
        let path = self.entry_path(url);
        match fs::read(&path).await {
            Ok(bytes) => {
                trace!(url, path = %path.display(), "preload cache hit");
                Some(bytes)
            }
            Err(_) => {
                trace!(url, "preload cache miss");
                None
            }
        }
    }

    async fn put(&self, url: &str, bytes: &[u8]) -> LoadResult<()> {
        let path = self.entry_path(url);
        let old_size = fs::metadata(&path).await.map(|m| m.len()).ok();

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| LoadError::Io(format!("failed to create cache file: {e}")))?;
        file.write_all(bytes)
            .await
            .map_err(|e| LoadError::Io(format!("failed to write cache file: {e}")))?;
        file.flush()
            .await
            .map_err(|e| LoadError::Io(format!("failed to flush cache file: {e}")))?;

        let new_size = bytes.len() as u64;
        if let Some(old) = old_size {
            if new_size > old {
                self.current_size.fetch_add(new_size - old, Ordering::Relaxed);
            } else {
                self.current_size.fetch_sub(old - new_size, Ordering::Relaxed);
            }
        } else {
            self.current_size.fetch_add(new_size, Ordering::Relaxed);
            self.item_count.fetch_add(1, Ordering::Relaxed);
        }

        debug!(url, size = bytes.len(), "image stored in preload cache");
        self.sweep_if_needed().await;
        Ok(())
    }

    async fn contains(&self, url: &str) -> bool {
        fs::try_exists(&self.entry_path(url)).await.unwrap_or(false)
    }

    async fn evict(&self, url: &str) {
        let path = self.entry_path(url);
        let size = fs::metadata(&path).await.map(|m| m.len()).ok();
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(url, error = %e, "failed to evict cache entry");
            }
        } else if let Some(size) = size {
            self.current_size.fetch_sub(size, Ordering::Relaxed);
            self.item_count.fetch_sub(1, Ordering::Relaxed);
            debug!(url, "evicted from preload cache");
        }
    }

    async fn clear(&self) -> LoadResult<()> {
        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| LoadError::Io(format!("failed to read cache dir: {e}")))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LoadError::Io(format!("failed to read entry: {e}")))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == CACHE_EXT)
                && fs::remove_file(&path).await.is_err()
            {
                warn!(path = %path.display(), "failed to remove cache file");
            }
        }

        self.current_size.store(0, Ordering::Relaxed);
        self.item_count.store(0, Ordering::Relaxed);
        debug!("preload cache cleared");
        Ok(())
    }

    async fn len(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for DiskPreloadCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskPreloadCache")
            .field("cache_dir", &self.cache_dir)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

/// Default cache directory for image bytes.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    project_dirs().map_or_else(
        || std::env::temp_dir().join("galleria").join("cache").join("images"),
        |dirs| dirs.cache_dir().join("images"),
    )
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn create_test_cache() -> (DiskPreloadCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskPreloadCache::new(temp_dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (cache, temp_dir)
    }

    #[tokio::test]
    async fn put_and_get_roundtrip() {
        let (cache, _temp) = create_test_cache().await;

        cache.put("https://g.test/a.png", b"image data").await.unwrap();

        assert_eq!(
            cache.get("https://g.test/a.png").await.as_deref(),
            Some(b"image data".as_slice())
        );
    }

    #[tokio::test]
    async fn missing_url_is_a_miss() {
        let (cache, _temp) = create_test_cache().await;
        assert!(cache.get("https://g.test/missing.png").await.is_none());
    }

    #[tokio::test]
    async fn evict_removes_the_entry() {
        let (cache, _temp) = create_test_cache().await;

        cache.put("https://g.test/a.png", b"data").await.unwrap();
        assert!(cache.contains("https://g.test/a.png").await);

        cache.evict("https://g.test/a.png").await;
        assert!(!cache.contains("https://g.test/a.png").await);
    }

    #[tokio::test]
    async fn clear_empties_the_cache() {
        let (cache, _temp) = create_test_cache().await;

        cache.put("https://g.test/a.png", b"one").await.unwrap();
        cache.put("https://g.test/b.png", b"two").await.unwrap();
        assert_eq!(cache.len().await, 2);

        cache.clear().await.unwrap();
        assert_eq!(cache.len().await, 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn counters_track_overwrites_and_evictions() {
        let (cache, _temp) = create_test_cache().await;

        cache.put("https://g.test/a.png", b"hello").await.unwrap();
        cache.put("https://g.test/b.png", b"world!").await.unwrap();
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.current_size(), 11);

        cache.put("https://g.test/a.png", b"hey").await.unwrap();
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.current_size(), 9);

        cache.evict("https://g.test/b.png").await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.current_size(), 3);
    }

    #[tokio::test]
    async fn sweep_drops_entries_once_over_limit() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskPreloadCache::new(temp_dir.path().to_path_buf(), 10)
            .await
            .unwrap();

        cache.put("https://g.test/a.png", b"123456").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        cache.put("https://g.test/b.png", b"123456").await.unwrap();

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.current_size(), 6);
    }

    #[tokio::test]
    async fn reopen_restores_the_counters() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = DiskPreloadCache::new(temp_dir.path().to_path_buf(), 1024)
                .await
                .unwrap();
            cache.put("https://g.test/a.png", b"12345").await.unwrap();
        }

        let cache = DiskPreloadCache::new(temp_dir.path().to_path_buf(), 1024)
            .await
            .unwrap();
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.current_size(), 5);
    }
}
