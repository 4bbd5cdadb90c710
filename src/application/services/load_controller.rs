//! Per-asset load state machine with bounded retry.
//!
//! Each rendered asset instance owns one [`LoadController`]. The machine
//! moves `Idle -> Loading -> Loaded | Failed`; automatic retries stay
//! within `Loading`, and a manual [`LoadController::retry`] recovers from
//! `Failed`. Every attempt reads through the cache tiers in order:
//! memory cache, then the persistent preload cache, then the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::domain::entities::{CacheKey, LoadPhase, LoadSource, LoadState, LoadedAsset};
use crate::domain::ports::{
    ImageCachePort, ImageFetchPort, LoadError, LoadResult, PreloadCachePort,
};

/// Default number of automatic retries before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default fixed delay between automatic retries.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Tuning for a load controller.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Automatic retries allowed per attempt chain.
    pub max_retries: u32,
    /// Fixed delay between automatic retries.
    pub retry_delay: Duration,
    /// Optional fallback image shown dimmed when loading fails terminally.
    pub fallback_url: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            fallback_url: None,
        }
    }
}

/// Message sent when an asset finishes loading or fails terminally.
#[derive(Debug, Clone)]
pub struct LoadEvent {
    /// Cache key of the asset URL.
    pub key: CacheKey,
    /// The URL that was loaded.
    pub url: String,
    /// Load provenance, or the terminal error message.
    pub result: Result<LoadSource, String>,
}

/// State shared between the controller handle and its attempt task.
struct Shared {
    state: Mutex<LoadState>,
    image: Mutex<Option<Arc<image::DynamicImage>>>,
    // Bumped on every restart/reset; attempt chains carrying a stale
    // generation must not touch state.
    generation: AtomicU64,
}

/// Everything an attempt chain needs, detached from the handle.
struct AttemptContext {
    url: String,
    key: CacheKey,
    config: LoaderConfig,
    fetcher: Arc<dyn ImageFetchPort>,
    preload_cache: Option<Arc<dyn PreloadCachePort>>,
    memory_cache: Option<Arc<dyn ImageCachePort>>,
    event_tx: Option<mpsc::UnboundedSender<LoadEvent>>,
    shared: Arc<Shared>,
}

/// Per-asset load controller.
pub struct LoadController {
    url: Mutex<String>,
    key: Mutex<CacheKey>,
    config: LoaderConfig,
    fetcher: Arc<dyn ImageFetchPort>,
    preload_cache: Option<Arc<dyn PreloadCachePort>>,
    memory_cache: Option<Arc<dyn ImageCachePort>>,
    event_tx: Option<mpsc::UnboundedSender<LoadEvent>>,
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LoadController {
    /// Creates a controller for `url` in the `Idle` phase.
    #[must_use]
    pub fn new(url: impl Into<String>, fetcher: Arc<dyn ImageFetchPort>) -> Self {
        Self::with_config(url, fetcher, LoaderConfig::default())
    }

    /// Creates a controller with explicit tuning.
    #[must_use]
    pub fn with_config(
        url: impl Into<String>,
        fetcher: Arc<dyn ImageFetchPort>,
        config: LoaderConfig,
    ) -> Self {
        let url = url.into();
        let key = CacheKey::from_url(&url);
        Self {
            url: Mutex::new(url),
            key: Mutex::new(key),
            config,
            fetcher,
            preload_cache: None,
            memory_cache: None,
            event_tx: None,
            shared: Arc::new(Shared {
                state: Mutex::new(LoadState::default()),
                image: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    /// Attaches the persistent preload cache.
    #[must_use]
    pub fn with_preload_cache(mut self, cache: Arc<dyn PreloadCachePort>) -> Self {
        self.preload_cache = Some(cache);
        self
    }

    /// Attaches the decoded-image memory cache.
    #[must_use]
    pub fn with_memory_cache(mut self, cache: Arc<dyn ImageCachePort>) -> Self {
        self.memory_cache = Some(cache);
        self
    }

    /// Attaches a channel receiving completion events.
    #[must_use]
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<LoadEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Snapshot of the current load state.
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.shared.state.lock().clone()
    }

    /// The decoded image, once loaded.
    #[must_use]
    pub fn image(&self) -> Option<Arc<image::DynamicImage>> {
        self.shared.image.lock().clone()
    }

    /// The URL currently being loaded.
    #[must_use]
    pub fn url(&self) -> String {
        self.url.lock().clone()
    }

    /// Fallback image URL, if configured.
    #[must_use]
    pub fn fallback_url(&self) -> Option<&str> {
        self.config.fallback_url.as_deref()
    }

    /// Unblocks loading; called when the asset enters the viewport (or
    /// immediately for priority assets).
    ///
    /// Transitions `Idle -> Loading` exactly once. Repeat calls and calls
    /// with an empty URL are ignored.
    pub fn mark_visible(&self) {
        {
            let url = self.url.lock();
            if url.is_empty() {
                return;
            }
            let mut state = self.shared.state.lock();
            if !state.phase.is_idle() {
                return;
            }
            state.phase = LoadPhase::Loading;
        }
        trace!(key = %self.key.lock(), "visibility unblocked load");
        self.spawn_chain();
    }

    /// Manual retry: zeroes the attempt counter, clears the failure, and
    /// re-enters `Loading` regardless of the current phase.
    pub fn retry(&self) {
        {
            let mut state = self.shared.state.lock();
            state.phase = LoadPhase::Loading;
            state.retry_attempts = 0;
            state.error = None;
        }
        debug!(key = %self.key.lock(), "manual retry");
        self.spawn_chain();
    }

    /// Changes the asset's source identity.
    ///
    /// Resets the whole state to `Idle`, cancels any scheduled retry, and
    /// discards the result of any in-flight fetch.
    pub fn set_source(&self, url: impl Into<String>) {
        self.cancel();
        let url = url.into();
        let key = CacheKey::from_url(&url);
        *self.shared.state.lock() = LoadState::default();
        *self.shared.image.lock() = None;
        *self.url.lock() = url;
        *self.key.lock() = key;
    }

    /// Aborts the pending attempt chain, if any, and invalidates
    /// in-flight results.
    fn cancel(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }

    /// Starts a fresh attempt chain, replacing any previous one.
    fn spawn_chain(&self) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }

        let ctx = AttemptContext {
            url: self.url.lock().clone(),
            key: self.key.lock().clone(),
            config: self.config.clone(),
            fetcher: self.fetcher.clone(),
            preload_cache: self.preload_cache.clone(),
            memory_cache: self.memory_cache.clone(),
            event_tx: self.event_tx.clone(),
            shared: self.shared.clone(),
        };

        let handle = tokio::spawn(run_attempts(ctx, generation));
        *self.task.lock() = Some(handle);
    }
}

impl Drop for LoadController {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for LoadController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadController")
            .field("url", &self.url.lock())
            .field("state", &self.shared.state.lock())
            .finish_non_exhaustive()
    }
}

/// Runs fetch attempts until success, exhaustion, or cancellation.
async fn run_attempts(ctx: AttemptContext, generation: u64) {
    loop {
        let started = Instant::now();
        let outcome = attempt(&ctx).await;

        if ctx.shared.generation.load(Ordering::SeqCst) != generation {
            return;
        }

        match outcome {
            Ok(loaded) => {
                *ctx.shared.image.lock() = Some(loaded.image);
                {
                    let mut state = ctx.shared.state.lock();
                    state.phase = LoadPhase::Loaded;
                    state.load_time = Some(started.elapsed());
                    state.error = None;
                    state.source = Some(loaded.source);
                }
                debug!(key = %ctx.key, source = %loaded.source, "asset loaded");
                if let Some(tx) = &ctx.event_tx {
                    let _ = tx.send(LoadEvent {
                        key: ctx.key.clone(),
                        url: ctx.url.clone(),
                        result: Ok(loaded.source),
                    });
                }
                return;
            }
            Err(error) => {
                let attempt_no = {
                    let mut state = ctx.shared.state.lock();
                    if state.retry_attempts < ctx.config.max_retries {
                        state.retry_attempts += 1;
                        Some(state.retry_attempts)
                    } else {
                        state.phase = LoadPhase::Failed;
                        state.error = Some(error.to_string());
                        None
                    }
                };

                let Some(attempt_no) = attempt_no else {
                    warn!(key = %ctx.key, error = %error, "asset failed, retries exhausted");
                    if let Some(tx) = &ctx.event_tx {
                        let _ = tx.send(LoadEvent {
                            key: ctx.key.clone(),
                            url: ctx.url.clone(),
                            result: Err(error.to_string()),
                        });
                    }
                    return;
                };

                debug!(
                    key = %ctx.key,
                    attempt = attempt_no,
                    error = %error,
                    "load failed, retrying after delay"
                );
                tokio::time::sleep(ctx.config.retry_delay).await;
                if ctx.shared.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
            }
        }
    }
}

/// One tiered load attempt: memory cache, preload cache, then network.
async fn attempt(ctx: &AttemptContext) -> LoadResult<LoadedAsset> {
    if let Some(cache) = &ctx.memory_cache
        && let Some(image) = cache.get(&ctx.key).await
    {
        return Ok(LoadedAsset {
            key: ctx.key.clone(),
            image,
            source: LoadSource::Memory,
        });
    }

    if let Some(cache) = &ctx.preload_cache
        && let Some(bytes) = cache.get(&ctx.url).await
    {
        match decode(Bytes::from(bytes)).await {
            Ok(image) => {
                if let Some(memory) = &ctx.memory_cache {
                    memory.put(ctx.key.clone(), image.clone()).await;
                }
                return Ok(LoadedAsset {
                    key: ctx.key.clone(),
                    image,
                    source: LoadSource::PreloadCache,
                });
            }
            Err(error) => {
                // Corrupt entry; drop it and fall through to the network.
                warn!(key = %ctx.key, error = %error, "evicting undecodable cache entry");
                cache.evict(&ctx.url).await;
            }
        }
    }

    let bytes = ctx.fetcher.fetch(&ctx.url).await?;
    let image = decode(bytes.clone()).await?;

    if let Some(cache) = &ctx.preload_cache
        && let Err(error) = cache.put(&ctx.url, &bytes).await
    {
        warn!(key = %ctx.key, error = %error, "failed to cache fetched image");
    }
    if let Some(memory) = &ctx.memory_cache {
        memory.put(ctx.key.clone(), image.clone()).await;
    }

    Ok(LoadedAsset {
        key: ctx.key.clone(),
        image,
        source: LoadSource::Network,
    })
}

/// Decodes image bytes off the async threads.
async fn decode(bytes: Bytes) -> LoadResult<Arc<image::DynamicImage>> {
    let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| LoadError::Decode(format!("decode task panicked: {e}")))?
        .map_err(|e| LoadError::Decode(e.to_string()))?;
    Ok(Arc::new(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::{
        BrokenPreloadCache, MapPreloadCache, ScriptedFetcher, tiny_png,
    };

    const URL: &str = "https://gallery.test/storage/portfolio/1.png";

    fn fast_config() -> LoaderConfig {
        LoaderConfig {
            max_retries: 3,
            retry_delay: Duration::from_millis(50),
            fallback_url: None,
        }
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<LoadEvent>) -> LoadEvent {
        rx.recv().await.expect("load event")
    }

    #[tokio::test]
    async fn priority_mount_enters_loading_synchronously() {
        let fetcher = Arc::new(ScriptedFetcher::ok());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = LoadController::new(URL, fetcher).with_events(tx);

        controller.mark_visible();
        assert!(controller.state().phase.is_loading());

        let event = next_event(&mut rx).await;
        assert_eq!(event.result, Ok(LoadSource::Network));
        let state = controller.state();
        assert!(state.phase.is_loaded());
        assert!(state.load_time.is_some());
        assert!(controller.image().is_some());
    }

    #[tokio::test]
    async fn stays_idle_until_marked_visible() {
        let fetcher = Arc::new(ScriptedFetcher::ok());
        let controller = LoadController::new(URL, fetcher.clone());

        tokio::task::yield_now().await;
        assert!(controller.state().phase.is_idle());
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_url_never_starts_loading() {
        let fetcher = Arc::new(ScriptedFetcher::ok());
        let controller = LoadController::new("", fetcher.clone());

        controller.mark_visible();
        tokio::task::yield_now().await;
        assert!(controller.state().phase.is_idle());
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn repeat_visibility_is_single_flight() {
        let fetcher = Arc::new(ScriptedFetcher::ok());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = LoadController::new(URL, fetcher.clone()).with_events(tx);

        controller.mark_visible();
        controller.mark_visible();
        let _ = next_event(&mut rx).await;

        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_transition_to_failed() {
        let fetcher = Arc::new(ScriptedFetcher::failing_times(u32::MAX));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller =
            LoadController::with_config(URL, fetcher.clone(), fast_config()).with_events(tx);

        controller.mark_visible();
        let event = next_event(&mut rx).await;

        assert!(event.result.is_err());
        let state = controller.state();
        assert!(state.phase.is_failed());
        assert_eq!(state.retry_attempts, 3);
        assert!(state.error.is_some());
        // Initial attempt plus one per consumed retry, plus the attempt
        // that finds the counter exhausted.
        assert_eq!(fetcher.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_retry_after_failure_succeeds() {
        let fetcher = Arc::new(ScriptedFetcher::failing_times(4));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller =
            LoadController::with_config(URL, fetcher.clone(), fast_config()).with_events(tx);

        controller.mark_visible();
        let event = next_event(&mut rx).await;
        assert!(event.result.is_err());
        assert!(controller.state().phase.is_failed());

        controller.retry();
        assert!(controller.state().phase.is_loading());
        let event = next_event(&mut rx).await;
        assert_eq!(event.result, Ok(LoadSource::Network));

        let state = controller.state();
        assert!(state.phase.is_loaded());
        assert!(state.load_time.is_some());
        assert!(state.error.is_none());
        // retry() zeroed the counter and the successful load leaves it.
        assert_eq!(state.retry_attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_bytes_count_as_attempt_failures() {
        let fetcher = Arc::new(ScriptedFetcher::undecodable());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller =
            LoadController::with_config(URL, fetcher.clone(), fast_config()).with_events(tx);

        controller.mark_visible();
        let event = next_event(&mut rx).await;

        assert!(event.result.is_err());
        assert!(controller.state().phase.is_failed());
    }

    #[tokio::test]
    async fn success_writes_through_preload_cache() {
        let fetcher = Arc::new(ScriptedFetcher::ok());
        let cache = Arc::new(MapPreloadCache::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = LoadController::new(URL, fetcher)
            .with_preload_cache(cache.clone())
            .with_events(tx);

        controller.mark_visible();
        let _ = next_event(&mut rx).await;

        assert!(cache.contains(URL).await);
    }

    #[tokio::test]
    async fn cache_write_failure_is_silent() {
        let fetcher = Arc::new(ScriptedFetcher::ok());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = LoadController::new(URL, fetcher)
            .with_preload_cache(Arc::new(BrokenPreloadCache))
            .with_events(tx);

        controller.mark_visible();
        let event = next_event(&mut rx).await;

        assert_eq!(event.result, Ok(LoadSource::Network));
        assert!(controller.state().phase.is_loaded());
    }

    #[tokio::test]
    async fn warm_cache_serves_without_network() {
        let fetcher = Arc::new(ScriptedFetcher::ok());
        let cache = Arc::new(MapPreloadCache::new());
        cache.put(URL, &tiny_png()).await.unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = LoadController::new(URL, fetcher.clone())
            .with_preload_cache(cache)
            .with_events(tx);

        controller.mark_visible();
        let event = next_event(&mut rx).await;

        assert_eq!(event.result, Ok(LoadSource::PreloadCache));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn set_source_resets_state_and_cancels_retries() {
        let fetcher = Arc::new(ScriptedFetcher::failing_times(2));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller =
            LoadController::with_config(URL, fetcher.clone(), fast_config()).with_events(tx);

        controller.mark_visible();
        // Let the first attempt fail and a retry get scheduled.
        tokio::task::yield_now().await;

        controller.set_source("https://gallery.test/storage/portfolio/2.png");
        let state = controller.state();
        assert!(state.phase.is_idle());
        assert_eq!(state.retry_attempts, 0);

        controller.mark_visible();
        let event = next_event(&mut rx).await;
        assert_eq!(event.url, "https://gallery.test/storage/portfolio/2.png");
        assert!(controller.state().phase.is_loaded());
    }
}
