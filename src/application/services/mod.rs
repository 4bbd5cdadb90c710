//! Application services: visibility gating, load control, preloading,
//! and collection browsing.

/// Category filtering and windowed pagination.
pub mod collection;
/// Per-asset load state machine.
pub mod load_controller;
/// Cache-backed batch preloader.
pub mod preloader;
/// One-shot viewport visibility detection.
pub mod visibility;

pub use collection::{CategoryFilter, CollectionBrowser, DEFAULT_PAGE_SIZE, PageMode};
pub use load_controller::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, LoadController, LoadEvent, LoaderConfig,
};
pub use preloader::{BatchProgress, Preloader, WARM_AHEAD};
pub use visibility::{
    DEFAULT_LOOKAHEAD_ROWS, DEFAULT_MIN_VISIBLE_RATIO, ObserverConfig, RowSpan, VisibilityGate,
};
