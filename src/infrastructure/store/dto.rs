//! Wire types for the gallery REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{AssetDraft, AssetId, AssetRecord};

/// Asset record as returned by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetRecordDto {
    /// Record identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Category used for filtering.
    pub category: String,
    /// Key of the image object in the storage bucket.
    pub storage_key: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<AssetRecordDto> for AssetRecord {
    fn from(dto: AssetRecordDto) -> Self {
        Self {
            id: AssetId::new(dto.id),
            title: dto.title,
            description: dto.description,
            category: dto.category,
            storage_key: dto.storage_key,
            created_at: dto.created_at,
        }
    }
}

/// Body of an asset creation request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAssetRequest {
    /// Human-readable title.
    pub title: String,
    /// Optional longer description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category used for filtering.
    pub category: String,
    /// Key of the already-uploaded image object.
    pub storage_key: String,
}

impl From<AssetDraft> for CreateAssetRequest {
    fn from(draft: AssetDraft) -> Self {
        Self {
            title: draft.title,
            description: draft.description,
            category: draft.category,
            storage_key: draft.storage_key,
        }
    }
}

/// Error body returned by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,
}
