//! Cache keys and invalidation criteria.

use derive_more::Display;

/// Canonical cache key.
///
/// Every writer goes through this type so that the same hierarchy is never
/// stored under two spellings.
///
/// ```
/// use trellis_cache::CacheKey;
/// let key = CacheKey::hierarchy("drive", "1AbC", "9f2c41d07e3a");
/// assert_eq!(key.to_string(), "hierarchy:drive:1AbC:9f2c41d07e3a");
/// assert_eq!(CacheKey::from("legacy-key").to_string(), "legacy-key");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum CacheKey {
    /// A resolved hierarchy rooted at `root_id` on `provider`. `variant`
    /// identifies the build options that shape the tree, so trees built
    /// differently from the same folder never share an entry.
    #[display("hierarchy:{provider}:{root_id}:{variant}")]
    Hierarchy {
        provider: String,
        root_id: String,
        variant: String,
    },
    /// Any other key, stored verbatim.
    #[display("{_0}")]
    Custom(String),
}
impl CacheKey {
    pub fn hierarchy(provider: impl Into<String>, root_id: impl Into<String>, variant: impl Into<String>) -> Self {
        Self::Hierarchy {
            provider: provider.into(),
            root_id: root_id.into(),
            variant: variant.into(),
        }
    }
}
impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self::Custom(key.to_string())
    }
}
impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self::Custom(key)
    }
}

/// Which entries to drop in [`CacheStore::invalidate`](crate::CacheStore::invalidate).
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Invalidation {
    /// Exactly one key.
    #[display("key {_0}")]
    Key(CacheKey),
    /// Every entry built from a folder.
    #[display("folder {_0}")]
    Folder(String),
    /// Every entry of the single mapping for this route.
    #[display("route ({route_type}, {route_subtype})")]
    Route { route_type: String, route_subtype: String },
    /// Every entry of every mapping sharing a route type.
    #[display("route type {_0}")]
    RouteType(String),
}
impl Invalidation {
    pub fn route(route_type: impl Into<String>, route_subtype: impl Into<String>) -> Self {
        Self::Route {
            route_type: route_type.into(),
            route_subtype: route_subtype.into(),
        }
    }
}
