//! Asset record types owned by the remote record store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier of an asset record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    /// Creates a new `AssetId` from any string-like input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A single media item with metadata and a storage key.
///
/// Records are owned by the remote store; the client only holds read-only
/// copies and never mutates them in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Record identifier assigned by the store.
    pub id: AssetId,
    /// Human-readable title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Category used for filtering.
    pub category: String,
    /// Key of the image object in the storage bucket.
    pub storage_key: String,
    /// Creation timestamp; the store lists records newest first.
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a new asset record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDraft {
    /// Human-readable title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Category used for filtering.
    pub category: String,
    /// Key of the already-uploaded image object.
    pub storage_key: String,
}

impl AssetDraft {
    /// Creates a draft with a title, category, and storage key.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            category: category.into(),
            storage_key: storage_key.into(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_id_display_roundtrip() {
        let id = AssetId::new("abc-123");
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn draft_builder() {
        let draft = AssetDraft::new("Dunes", "Nature", "portfolio/dunes.png")
            .with_description("evening light");
        assert_eq!(draft.description.as_deref(), Some("evening light"));
        assert_eq!(draft.category, "Nature");
    }
}
