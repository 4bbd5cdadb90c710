//! Built-in sample collection for offline browsing.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::entities::{AssetDraft, AssetId, AssetRecord};
use crate::domain::errors::GalleryError;
use crate::domain::ports::AssetStorePort;

// Titles cycle through the five portfolio categories.
const SAMPLE_ASSETS: [(&str, &str); 18] = [
    ("Morning Dunes", "Nature"),
    ("Crosswalk Rush", "Street"),
    ("Window Light", "Portrait"),
    ("First Dance", "Wedding"),
    ("Fox at Dusk", "Animals"),
    ("Pine Ridge", "Nature"),
    ("Neon Alley", "Street"),
    ("Studio Profile", "Portrait"),
    ("Confetti Exit", "Wedding"),
    ("Harbor Gulls", "Animals"),
    ("Storm Front", "Nature"),
    ("Subway Mirror", "Street"),
    ("Golden Hour", "Portrait"),
    ("The Vows", "Wedding"),
    ("Barn Cats", "Animals"),
    ("Tidal Flats", "Nature"),
    ("Market Corner", "Street"),
    ("Silver Gelatin", "Portrait"),
];

/// In-memory asset store seeded with a sample collection.
///
/// Serves the `--offline` mode so the client can be driven without a
/// gallery server; mutations behave like the real store's.
pub struct StaticAssetStore {
    records: RwLock<Vec<AssetRecord>>,
}

impl StaticAssetStore {
    /// Creates a store holding the sample collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(sample_collection()),
        }
    }

    /// Creates a store holding the given records.
    #[must_use]
    pub fn with_records(records: Vec<AssetRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

impl Default for StaticAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the sample records, newest first.
#[must_use]
pub fn sample_collection() -> Vec<AssetRecord> {
    let now = Utc::now();
    SAMPLE_ASSETS
        .iter()
        .enumerate()
        .map(|(i, (title, category))| AssetRecord {
            id: AssetId::new(Uuid::new_v4().to_string()),
            title: (*title).to_string(),
            description: None,
            category: (*category).to_string(),
            storage_key: format!("portfolio/{}.png", i + 1),
            created_at: now - Duration::minutes(i64::try_from(i).unwrap_or(0)),
        })
        .collect()
}

#[async_trait]
impl AssetStorePort for StaticAssetStore {
    async fn list_assets(&self) -> Result<Vec<AssetRecord>, GalleryError> {
        Ok(self.records.read().await.clone())
    }

    async fn delete_asset(&self, id: &AssetId) -> Result<(), GalleryError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != *id);
        if records.len() == before {
            return Err(GalleryError::not_found(id.as_str()));
        }
        debug!(id = %id, "sample asset deleted");
        Ok(())
    }

    async fn create_asset(&self, draft: AssetDraft) -> Result<AssetRecord, GalleryError> {
        let record = AssetRecord {
            id: AssetId::new(Uuid::new_v4().to_string()),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            storage_key: draft.storage_key,
            created_at: Utc::now(),
        };
        self.records.write().await.insert(0, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sample_collection_lists_newest_first() {
        let store = StaticAssetStore::new();
        let records = store.list_assets().await.unwrap();

        assert_eq!(records.len(), 18);
        assert!(records.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_record() {
        let store = StaticAssetStore::new();
        let records = store.list_assets().await.unwrap();
        let id = records[3].id.clone();

        store.delete_asset(&id).await.unwrap();

        assert_eq!(store.list_assets().await.unwrap().len(), 17);
        assert!(store.delete_asset(&id).await.is_err());
    }

    #[tokio::test]
    async fn create_prepends_a_fresh_record() {
        let store = StaticAssetStore::new();
        let record = store
            .create_asset(AssetDraft::new("New", "Nature", "portfolio/new.png"))
            .await
            .unwrap();

        let records = store.list_assets().await.unwrap();
        assert_eq!(records[0].id, record.id);
        assert_eq!(records.len(), 19);
    }
}
