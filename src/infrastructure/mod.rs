//! Infrastructure layer: adapters for configuration, the record store,
//! and media transport/caching.

/// Configuration loading and layering.
pub mod config;
/// Media transport and caches.
pub mod media;
/// Asset record store adapters.
pub mod store;

pub use config::{AppConfig, LogLevel};
pub use media::{DiskPreloadCache, HttpImageFetcher, MemoryImageCache, PublicUrlResolver};
pub use store::{HttpAssetStore, StaticAssetStore};
