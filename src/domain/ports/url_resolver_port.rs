//! Port definition for storage-key to URL resolution.

/// Maps a storage key to a fetchable URL.
///
/// Resolution is synchronous and side-effect-free; adapters precompute
/// whatever base-URL state they need.
pub trait UrlResolverPort: Send + Sync {
    /// Returns the public URL for the given storage key.
    fn resolve_url(&self, storage_key: &str) -> String;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Resolver that prefixes keys with a fixed base.
    pub struct PrefixResolver {
        base: String,
    }

    impl PrefixResolver {
        /// Creates a resolver with the given base URL.
        pub fn new(base: impl Into<String>) -> Self {
            Self { base: base.into() }
        }
    }

    impl UrlResolverPort for PrefixResolver {
        fn resolve_url(&self, storage_key: &str) -> String {
            format!("{}/{storage_key}", self.base)
        }
    }
}
