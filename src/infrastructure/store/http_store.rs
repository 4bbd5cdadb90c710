//! HTTP adapter for the gallery record store.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use tracing::{debug, warn};

use super::dto::{AssetRecordDto, CreateAssetRequest, ErrorResponse};
use crate::domain::entities::{AssetDraft, AssetId, AssetRecord};
use crate::domain::errors::GalleryError;
use crate::domain::ports::AssetStorePort;

const USER_AGENT: &str = concat!("galleria/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Asset store backed by the gallery server's REST API.
pub struct HttpAssetStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAssetStore {
    /// Creates a store client for the given server.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, GalleryError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GalleryError::unexpected(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn assets_url(&self) -> String {
        format!("{}/api/assets", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(header::AUTHORIZATION, format!("Bearer {key}")),
            None => request,
        }
    }

    fn map_transport_error(e: &reqwest::Error) -> GalleryError {
        if e.is_timeout() {
            GalleryError::network("request timed out")
        } else if e.is_connect() {
            GalleryError::network("failed to connect to the gallery server")
        } else {
            GalleryError::network(e.to_string())
        }
    }

    async fn error_message(status: StatusCode, response: reqwest::Response) -> String {
        match response.json::<ErrorResponse>().await {
            Ok(body) if !body.message.is_empty() => body.message,
            _ => format!("HTTP {status}"),
        }
    }
}

#[async_trait]
impl AssetStorePort for HttpAssetStore {
    async fn list_assets(&self) -> Result<Vec<AssetRecord>, GalleryError> {
        debug!(url = %self.assets_url(), "listing assets");

        let response = self
            .authorize(self.client.get(self.assets_url()))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "asset listing request failed");
                Self::map_transport_error(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(status, response).await;
            return Err(GalleryError::list_failed(message));
        }

        let dtos: Vec<AssetRecordDto> = response
            .json()
            .await
            .map_err(|e| GalleryError::list_failed(format!("failed to parse listing: {e}")))?;

        debug!(count = dtos.len(), "asset listing parsed");
        Ok(dtos.into_iter().map(AssetRecord::from).collect())
    }

    async fn delete_asset(&self, id: &AssetId) -> Result<(), GalleryError> {
        let url = format!("{}/{}", self.assets_url(), id.as_str());
        debug!(%url, "deleting asset");

        let response = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| Self::map_transport_error(&e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GalleryError::not_found(id.as_str()));
        }
        if !status.is_success() {
            let message = Self::error_message(status, response).await;
            return Err(GalleryError::delete_failed(id.as_str(), message));
        }
        Ok(())
    }

    async fn create_asset(&self, draft: AssetDraft) -> Result<AssetRecord, GalleryError> {
        debug!(title = %draft.title, "creating asset");

        let response = self
            .authorize(self.client.post(self.assets_url()))
            .json(&CreateAssetRequest::from(draft))
            .send()
            .await
            .map_err(|e| Self::map_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(status, response).await;
            return Err(GalleryError::create_failed(message));
        }

        let dto: AssetRecordDto = response
            .json()
            .await
            .map_err(|e| GalleryError::create_failed(format!("failed to parse record: {e}")))?;

        Ok(AssetRecord::from(dto))
    }
}

impl std::fmt::Debug for HttpAssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAssetStore")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}
