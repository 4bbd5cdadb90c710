//! Collection-level error types.

use thiserror::Error;

/// Errors surfaced by the asset record store and the collection view.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum GalleryError {
    #[error("failed to list assets: {message}")]
    ListFailed { message: String },

    #[error("failed to delete asset {id}: {message}")]
    DeleteFailed { id: String, message: String },

    #[error("failed to create asset: {message}")]
    CreateFailed { message: String },

    #[error("asset not found: {id}")]
    NotFound { id: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("unexpected gallery error: {message}")]
    Unexpected { message: String },
}

impl GalleryError {
    /// Creates a listing failure.
    #[must_use]
    pub fn list_failed(message: impl Into<String>) -> Self {
        Self::ListFailed {
            message: message.into(),
        }
    }

    /// Creates a deletion failure.
    #[must_use]
    pub fn delete_failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeleteFailed {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a creation failure.
    #[must_use]
    pub fn create_failed(message: impl Into<String>) -> Self {
        Self::CreateFailed {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }
}
