//! Cache-backed batch preloader.
//!
//! Warms the persistent preload cache for upcoming content. Warming is
//! advisory only: it never flips any per-asset load state, it just makes
//! the subsequent real fetch a local read.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::{trace, warn};

use crate::domain::ports::{ImageFetchPort, LoadError, LoadResult, PreloadCachePort};

/// Number of leading window assets warmed on mount or page change.
pub const WARM_AHEAD: usize = 4;

/// Progress of a batch preload, suitable for a progress indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchProgress {
    /// Preloads that fetched and decoded successfully.
    pub loaded_count: usize,
    /// Preloads that failed; they count toward completion only.
    pub failed_count: usize,
    /// Number of URLs in the batch.
    pub total_count: usize,
    /// True once every attempt has settled, success or failure.
    pub is_complete: bool,
}

impl BatchProgress {
    /// Fraction of the batch loaded successfully, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.loaded_count as f64 / self.total_count as f64
        }
    }
}

/// Best-effort preloader over the fetch port and the preload cache.
pub struct Preloader {
    fetcher: Arc<dyn ImageFetchPort>,
    cache: Arc<dyn PreloadCachePort>,
    progress_tx: watch::Sender<BatchProgress>,
}

impl Preloader {
    /// Creates a preloader.
    #[must_use]
    pub fn new(fetcher: Arc<dyn ImageFetchPort>, cache: Arc<dyn PreloadCachePort>) -> Self {
        let (progress_tx, _) = watch::channel(BatchProgress::default());
        Self {
            fetcher,
            cache,
            progress_tx,
        }
    }

    /// Subscribes to live progress of the current batch.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<BatchProgress> {
        self.progress_tx.subscribe()
    }

    /// Preloads one URL: fetch, decode, then best-effort cache insert.
    ///
    /// An already-cached URL resolves immediately. Cache insertion
    /// failures are logged and never surfaced.
    ///
    /// # Errors
    /// Returns an error if the fetch or the decode fails.
    pub async fn preload(&self, url: &str) -> LoadResult<()> {
        if self.cache.contains(url).await {
            trace!(url, "preload cache already warm");
            return Ok(());
        }

        let bytes = self.fetcher.fetch(url).await?;

        let bytes_for_decode = bytes.clone();
        tokio::task::spawn_blocking(move || image::load_from_memory(&bytes_for_decode))
            .await
            .map_err(|e| LoadError::Decode(format!("decode task panicked: {e}")))?
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        if let Err(error) = self.cache.put(url, &bytes).await {
            warn!(url, error = %error, "preload cache insert failed");
        }
        trace!(url, "preloaded");
        Ok(())
    }

    /// Preloads every URL concurrently, with no cap at this layer, and
    /// resolves once each attempt has settled.
    pub async fn preload_all(&self, urls: &[String]) -> BatchProgress {
        let total_count = urls.len();
        if total_count == 0 {
            let done = BatchProgress {
                is_complete: true,
                ..BatchProgress::default()
            };
            self.progress_tx.send_replace(done);
            return done;
        }

        self.progress_tx.send_replace(BatchProgress {
            total_count,
            ..BatchProgress::default()
        });

        let loaded = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        join_all(urls.iter().map(|url| {
            let loaded = &loaded;
            let failed = &failed;
            async move {
                if self.preload(url).await.is_ok() {
                    loaded.fetch_add(1, Ordering::SeqCst);
                } else {
                    failed.fetch_add(1, Ordering::SeqCst);
                }
                let loaded_count = loaded.load(Ordering::SeqCst);
                let failed_count = failed.load(Ordering::SeqCst);
                self.progress_tx.send_replace(BatchProgress {
                    loaded_count,
                    failed_count,
                    total_count,
                    is_complete: loaded_count + failed_count == total_count,
                });
            }
        }))
        .await;

        let done = BatchProgress {
            loaded_count: loaded.load(Ordering::SeqCst),
            failed_count: failed.load(Ordering::SeqCst),
            total_count,
            is_complete: true,
        };
        self.progress_tx.send_replace(done);
        done
    }
}
