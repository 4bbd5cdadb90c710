//! Public URL construction for storage objects.

use crate::domain::ports::UrlResolverPort;

/// Resolves storage keys to public object URLs on the gallery server.
///
/// The server exposes uploaded objects at
/// `{base}/storage/v1/object/public/{bucket}/{key}`.
#[derive(Debug, Clone)]
pub struct PublicUrlResolver {
    base_url: String,
    bucket: String,
}

impl PublicUrlResolver {
    /// Creates a resolver for the given server and bucket.
    #[must_use]
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
        }
    }
}

impl UrlResolverPort for PublicUrlResolver {
    fn resolve_url(&self, storage_key: &str) -> String {
        let key = storage_key.trim_start_matches('/');
        format!(
            "{}/storage/v1/object/public/{}/{key}",
            self.base_url, self.bucket
        )
    }
}
