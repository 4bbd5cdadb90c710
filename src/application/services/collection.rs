//! Category filtering and windowed pagination over the asset list.
//!
//! One browser serves both pagination strategies behind a single windowed
//! view: discrete pages with prev/next, and progressive reveal with
//! load-more/see-less. The full record list is fetched once and
//! re-fetchable on demand; deletions are committed locally only after the
//! store confirms them.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::entities::{AssetDraft, AssetId, AssetRecord};
use crate::domain::errors::GalleryError;
use crate::domain::ports::AssetStorePort;

/// Default window growth and page size.
pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Active category filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No filtering; every record passes.
    #[default]
    All,
    /// Only records of the named category pass.
    Only(String),
}

impl CategoryFilter {
    /// Returns true if a record of `category` passes the filter.
    #[must_use]
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(name) => name == category,
        }
    }

    /// Display label of the filter.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::All => "All",
            Self::Only(name) => name,
        }
    }
}

/// How the visible window advances through the filtered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageMode {
    /// Fixed-size pages with prev/next navigation.
    #[default]
    Discrete,
    /// Growing prefix with load-more/see-less.
    Progressive,
}

/// The collection view: filter state, window state, and the record list.
pub struct CollectionBrowser {
    store: Arc<dyn AssetStorePort>,
    records: Vec<AssetRecord>,
    category: CategoryFilter,
    mode: PageMode,
    page_size: usize,
    page_index: usize,
    visible_count: usize,
}

impl CollectionBrowser {
    /// Creates a browser with an empty record list.
    #[must_use]
    pub fn new(store: Arc<dyn AssetStorePort>, mode: PageMode, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            store,
            records: Vec::new(),
            category: CategoryFilter::All,
            mode,
            page_size,
            page_index: 0,
            visible_count: page_size,
        }
    }

    /// Fetches the full record list from the store.
    ///
    /// Keeps the current filter and window, clamping the page index to
    /// the new list. On failure the previous list is left untouched and
    /// the error is surfaced page-level by the caller.
    ///
    /// # Errors
    /// Returns the store's listing error.
    pub async fn load(&mut self) -> Result<(), GalleryError> {
        let records = self.store.list_assets().await?;
        info!(count = records.len(), "asset list fetched");
        self.records = records;
        self.clamp_page();
        Ok(())
    }

    /// The full record list as last fetched.
    #[must_use]
    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    /// Distinct categories in first-appearance order, prefixed with "All".
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut categories = vec!["All".to_string()];
        for record in &self.records {
            if !categories.iter().any(|c| *c == record.category) {
                categories.push(record.category.clone());
            }
        }
        categories
    }

    /// The active category filter.
    #[must_use]
    pub fn category(&self) -> &CategoryFilter {
        &self.category
    }

    /// Sets the category filter and resets the window to its initial
    /// state, for every value including "All".
    pub fn set_category(&mut self, category: CategoryFilter) {
        debug!(category = category.label(), "category changed");
        self.category = category;
        self.reset_window();
    }

    /// The active pagination mode.
    #[must_use]
    pub const fn mode(&self) -> PageMode {
        self.mode
    }

    /// Switches pagination mode and resets the window.
    pub fn set_mode(&mut self, mode: PageMode) {
        self.mode = mode;
        self.reset_window();
    }

    /// The configured page size / window increment.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Records passing the active category filter.
    #[must_use]
    pub fn filtered(&self) -> Vec<&AssetRecord> {
        self.records
            .iter()
            .filter(|r| self.category.matches(&r.category))
            .collect()
    }

    /// Number of records passing the filter.
    #[must_use]
    pub fn filtered_count(&self) -> usize {
        self.filtered().len()
    }

    /// The currently visible window of the filtered list.
    #[must_use]
    pub fn window(&self) -> Vec<&AssetRecord> {
        let filtered = self.filtered();
        match self.mode {
            PageMode::Discrete => filtered
                .into_iter()
                .skip(self.page_index * self.page_size)
                .take(self.page_size)
                .collect(),
            PageMode::Progressive => filtered
                .into_iter()
                .take(self.visible_count)
                .collect(),
        }
    }

    /// Total pages for the filtered list; never less than 1.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.filtered_count().div_ceil(self.page_size).max(1)
    }

    /// Zero-based index of the current page.
    #[must_use]
    pub const fn page_index(&self) -> usize {
        self.page_index
    }

    /// One-based `(current, total)` pair for a page indicator.
    #[must_use]
    pub fn page_display(&self) -> (usize, usize) {
        (self.page_index + 1, self.page_count())
    }

    /// True while a later page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }

    /// True while an earlier page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page_index > 0
    }

    /// Advances one page; returns false at the last page.
    pub fn next_page(&mut self) -> bool {
        if self.has_next() {
            self.page_index += 1;
            true
        } else {
            false
        }
    }

    /// Steps back one page; returns false at the first page.
    pub fn prev_page(&mut self) -> bool {
        if self.has_prev() {
            self.page_index -= 1;
            true
        } else {
            false
        }
    }

    /// Progressive mode: true while more records can be revealed.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.visible_count < self.filtered_count()
    }

    /// Progressive mode: true once everything is revealed beyond the
    /// initial window, so the view can collapse again.
    #[must_use]
    pub fn can_see_less(&self) -> bool {
        self.visible_count >= self.filtered_count() && self.visible_count > self.page_size
    }

    /// Reveals one more increment; returns false when nothing is hidden.
    pub fn load_more(&mut self) -> bool {
        if self.has_more() {
            self.visible_count += self.page_size;
            true
        } else {
            false
        }
    }

    /// Collapses the window back to the initial increment.
    pub fn see_less(&mut self) {
        self.visible_count = self.page_size;
    }

    /// Number of records the progressive window currently covers.
    #[must_use]
    pub const fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Deletes an asset through the store, committing the local removal
    /// only after the collaborator confirms it.
    ///
    /// # Errors
    /// Returns the store's deletion error; the local list is left
    /// unmodified in that case.
    pub async fn delete(&mut self, id: &AssetId) -> Result<(), GalleryError> {
        self.store.delete_asset(id).await?;
        self.commit_deletion(id);
        Ok(())
    }

    /// Applies a confirmed deletion to the in-memory list without a
    /// re-fetch, clamping the page index if the current page vanished.
    pub fn commit_deletion(&mut self, id: &AssetId) {
        let before = self.records.len();
        self.records.retain(|r| r.id != *id);
        if self.records.len() != before {
            debug!(id = %id, "asset removed from local list");
            self.clamp_page();
        }
    }

    /// Creates an asset through the store and prepends it locally
    /// (the list is ordered newest first).
    ///
    /// # Errors
    /// Returns the store's creation error.
    pub async fn create(&mut self, draft: AssetDraft) -> Result<AssetRecord, GalleryError> {
        let record = self.store.create_asset(draft).await?;
        self.records.insert(0, record.clone());
        Ok(record)
    }

    fn reset_window(&mut self) {
        self.page_index = 0;
        self.visible_count = self.page_size;
    }

    fn clamp_page(&mut self) {
        self.page_index = self.page_index.min(self.page_count() - 1);
    }
}

impl std::fmt::Debug for CollectionBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionBrowser")
            .field("records", &self.records.len())
            .field("category", &self.category)
            .field("mode", &self.mode)
            .field("page_index", &self.page_index)
            .field("visible_count", &self.visible_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::ports::mocks::{MockAssetStore, sample_records};

    const CATEGORIES: [&str; 5] = ["Nature", "Street", "Portrait", "Wedding", "Animals"];

    async fn browser_with(count: usize, mode: PageMode, page_size: usize) -> CollectionBrowser {
        let store = Arc::new(MockAssetStore::with_records(sample_records(
            count,
            &CATEGORIES,
        )));
        let mut browser = CollectionBrowser::new(store, mode, page_size);
        browser.load().await.unwrap();
        browser
    }

    #[tokio::test]
    async fn discrete_paging_over_ten_assets() {
        let mut browser = browser_with(10, PageMode::Discrete, 8).await;

        assert_eq!(browser.window().len(), 8);
        assert_eq!(browser.page_display(), (1, 2));
        assert!(browser.has_next());
        assert!(!browser.has_prev());

        assert!(browser.next_page());
        assert_eq!(browser.window().len(), 2);
        assert!(!browser.has_next());
        assert!(browser.has_prev());
        assert!(!browser.next_page());

        assert!(browser.prev_page());
        assert_eq!(browser.page_display(), (1, 2));
    }

    #[tokio::test]
    async fn progressive_reveal_over_ten_assets() {
        let mut browser = browser_with(10, PageMode::Progressive, 8).await;

        assert_eq!(browser.window().len(), 8);
        assert!(browser.has_more());
        assert!(!browser.can_see_less());

        assert!(browser.load_more());
        assert_eq!(browser.window().len(), 10);
        assert!(!browser.has_more());
        assert!(browser.can_see_less());

        browser.see_less();
        assert_eq!(browser.window().len(), 8);
        assert!(browser.has_more());
        assert!(!browser.can_see_less());
    }

    #[test_case(CategoryFilter::All; "all")]
    #[test_case(CategoryFilter::Only("Nature".to_string()); "nature")]
    #[test_case(CategoryFilter::Only("Animals".to_string()); "animals")]
    #[tokio::test]
    async fn category_change_resets_the_window(filter: CategoryFilter) {
        let mut browser = browser_with(30, PageMode::Discrete, 4).await;
        browser.next_page();
        browser.next_page();
        assert_eq!(browser.page_index(), 2);

        browser.set_category(filter);

        assert_eq!(browser.page_index(), 0);
        assert_eq!(browser.visible_count(), browser.page_size());
    }

    #[tokio::test]
    async fn categories_are_distinct_and_prefixed_with_all() {
        let browser = browser_with(10, PageMode::Discrete, 8).await;

        let categories = browser.categories();
        assert_eq!(categories[0], "All");
        assert_eq!(categories.len(), 1 + CATEGORIES.len());
        for name in CATEGORIES {
            assert_eq!(categories.iter().filter(|c| *c == name).count(), 1);
        }
    }

    #[tokio::test]
    async fn filter_narrows_the_list() {
        let browser = {
            let mut b = browser_with(10, PageMode::Discrete, 8).await;
            b.set_category(CategoryFilter::Only("Nature".to_string()));
            b
        };
        // Categories cycle over 5 names, so 2 of 10 records match.
        assert_eq!(browser.filtered_count(), 2);
        assert!(browser.window().iter().all(|r| r.category == "Nature"));
    }

    #[tokio::test]
    async fn deletion_commits_locally_without_refetch() {
        let store = Arc::new(MockAssetStore::with_records(sample_records(10, &CATEGORIES)));
        let mut browser = CollectionBrowser::new(store.clone(), PageMode::Discrete, 8);
        browser.load().await.unwrap();

        let id = browser.records()[0].id.clone();
        browser.delete(&id).await.unwrap();

        assert_eq!(browser.filtered_count(), 9);
        assert_eq!(store.len(), 9);
        assert!(!browser.records().iter().any(|r| r.id == id));
    }

    #[tokio::test]
    async fn deletion_failure_leaves_the_list_unmodified() {
        let store = Arc::new(MockAssetStore::with_records(sample_records(10, &CATEGORIES)));
        let mut browser = CollectionBrowser::new(store.clone(), PageMode::Discrete, 8);
        browser.load().await.unwrap();
        store.set_fail_delete(true);

        let id = browser.records()[0].id.clone();
        let result = browser.delete(&id).await;

        assert!(result.is_err());
        assert_eq!(browser.filtered_count(), 10);
    }

    #[tokio::test]
    async fn deleting_the_last_page_clamps_the_index() {
        let mut browser = browser_with(9, PageMode::Discrete, 4).await;
        browser.next_page();
        browser.next_page();
        assert_eq!(browser.page_display(), (3, 3));

        let id = browser.records()[8].id.clone();
        browser.delete(&id).await.unwrap();

        assert_eq!(browser.page_display(), (2, 2));
        assert_eq!(browser.window().len(), 4);
    }

    #[tokio::test]
    async fn listing_failure_is_surfaced() {
        let store = Arc::new(MockAssetStore::with_records(Vec::new()));
        store.set_fail_list(true);
        let mut browser = CollectionBrowser::new(store, PageMode::Discrete, 8);

        assert!(browser.load().await.is_err());
        assert!(browser.records().is_empty());
    }

    #[tokio::test]
    async fn empty_filtered_list_still_has_one_page() {
        let browser = browser_with(0, PageMode::Discrete, 8).await;

        assert_eq!(browser.page_count(), 1);
        assert_eq!(browser.page_display(), (1, 1));
        assert!(!browser.has_next());
        assert!(!browser.has_prev());
    }

    #[tokio::test]
    async fn creation_prepends_to_the_list() {
        let mut browser = browser_with(3, PageMode::Discrete, 8).await;

        let record = browser
            .create(AssetDraft::new("New", "Nature", "portfolio/new.png"))
            .await
            .unwrap();

        assert_eq!(browser.records()[0].id, record.id);
        assert_eq!(browser.filtered_count(), 4);
    }
}
