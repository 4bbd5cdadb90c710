//! Per-asset load state in the progressive loading pipeline.

use std::sync::Arc;
use std::time::Duration;

use super::cache_key::CacheKey;

/// Phase of an asset instance in the loading state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// Loading has not been triggered yet.
    #[default]
    Idle,
    /// A fetch is in flight or a retry is scheduled.
    Loading,
    /// The image is fully loaded and decoded.
    Loaded,
    /// Automatic retries are exhausted; only a manual retry recovers.
    Failed,
}

impl LoadPhase {
    /// Returns true if loading has not been triggered yet.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a fetch or scheduled retry is pending.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns true if the image is ready for display.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }

    /// Returns true if automatic retries are exhausted.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Where a loaded image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Served from the in-memory decoded-image cache.
    Memory,
    /// Served from the persistent preload cache.
    PreloadCache,
    /// Downloaded from the network.
    Network,
}

impl std::fmt::Display for LoadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::PreloadCache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Snapshot of one asset instance's load state.
///
/// Created when the instance mounts, mutated only by its own load
/// controller, discarded when the instance unmounts. `phase == Loaded`
/// implies `load_time` is set.
#[derive(Debug, Clone, Default)]
pub struct LoadState {
    /// Current phase of the state machine.
    pub phase: LoadPhase,
    /// Automatic retry attempts consumed so far; never exceeds the
    /// configured maximum.
    pub retry_attempts: u32,
    /// Wall-clock duration of the successful attempt, if any.
    pub load_time: Option<Duration>,
    /// Message of the last failure, cleared by a manual retry.
    pub error: Option<String>,
    /// Provenance of the loaded image, if any.
    pub source: Option<LoadSource>,
}

impl LoadState {
    /// Load time in whole milliseconds, if the asset is loaded.
    #[must_use]
    pub fn load_time_ms(&self) -> Option<u128> {
        self.load_time.map(|d| d.as_millis())
    }
}

/// A decoded image together with its key and provenance.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    /// Cache key of the source URL.
    pub key: CacheKey,
    /// The decoded image.
    pub image: Arc<image::DynamicImage>,
    /// Where the bytes came from.
    pub source: LoadSource,
}
