//! Media infrastructure.
//!
//! This module provides:
//! - Public URL construction for storage objects
//! - A semaphore-gated HTTP byte fetcher
//! - The persistent preload cache on disk
//! - An in-memory LRU cache for decoded images

mod disk_cache;
mod fetcher;
mod memory_cache;
mod public_url;

pub use disk_cache::{DEFAULT_MAX_CACHE_SIZE, DiskPreloadCache, default_cache_dir};
pub use fetcher::{DEFAULT_MAX_CONCURRENT_DOWNLOADS, DEFAULT_TIMEOUT_SECS, HttpImageFetcher};
pub use memory_cache::{CacheStats, DEFAULT_CACHE_SIZE, MemoryImageCache};
pub use public_url::PublicUrlResolver;
