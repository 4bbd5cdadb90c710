//! Port definition for the remote asset record store.

use async_trait::async_trait;

use crate::domain::entities::{AssetDraft, AssetId, AssetRecord};
use crate::domain::errors::GalleryError;

/// Port for the external store that owns asset records.
///
/// The store returns records ordered newest first. Implementations must be
/// thread-safe.
#[async_trait]
pub trait AssetStorePort: Send + Sync {
    /// Lists all asset records, newest first.
    async fn list_assets(&self) -> Result<Vec<AssetRecord>, GalleryError>;

    /// Deletes the record with the given id.
    async fn delete_asset(&self, id: &AssetId) -> Result<(), GalleryError>;

    /// Creates a record from the given fields and returns it.
    async fn create_asset(&self, draft: AssetDraft) -> Result<AssetRecord, GalleryError>;
}
