//! Cache-aside hierarchy reads.
//!
//! A read first looks the tree up under its canonical [`CacheKey`]. On a miss
//! the tree is built from the provider within a time limit and written back.
//! A build that times out or fails writes nothing, so a later read retries
//! from scratch instead of serving a partial tree.

use crate::builder::HierarchyBuilder;
use crate::error::{ErrorKind, Result};
use crate::item::HierarchyItem;
use exn::ResultExt;
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;
use trellis_cache::error::ErrorKind as CacheErrorKind;
use trellis_cache::{CacheKey, CacheStore, EntryScope};

/// Where a resolved tree came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Built,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub item: HierarchyItem,
    pub source: Source,
}

pub struct Resolver {
    builder: HierarchyBuilder,
    store: CacheStore,
    timeout: Duration,
}
impl Resolver {
    pub fn new(builder: HierarchyBuilder, store: CacheStore, timeout: Duration) -> Self {
        Self {
            builder,
            store,
            timeout,
        }
    }

    /// The key a tree rooted at `root_id` is cached under: this resolver's
    /// provider and build options are part of it.
    pub fn key(&self, root_id: &str) -> CacheKey {
        CacheKey::hierarchy(self.builder.provider_name(), root_id, self.builder.options().fingerprint())
    }

    /// Return the cached tree for `root_id`, building and caching it on a
    /// miss.
    ///
    /// `scope` is stored with a freshly built tree; its folder defaults to
    /// `root_id`. A cached payload that no longer deserializes is treated as a
    /// miss and overwritten.
    #[instrument(skip(self, scope))]
    pub async fn resolve(&self, root_id: &str, scope: &EntryScope) -> Result<Resolved> {
        let key = self.key(root_id);
        match self.store.get_json::<HierarchyItem>(&key).await {
            Ok(Some(item)) => {
                return Ok(Resolved {
                    item,
                    source: Source::Cache,
                });
            },
            Ok(None) => {},
            Err(err) if matches!(&*err, CacheErrorKind::InvalidData(_)) => {
                tracing::warn!(key = %key, error = %*err, "Discarding unreadable cached hierarchy");
            },
            Err(err) => return Err(err.raise(ErrorKind::Cache)),
        }
        self.rebuild(root_id, key, scope).await
    }

    /// Build `root_id` from the provider and overwrite any cached copy.
    #[instrument(skip(self, scope))]
    pub async fn refresh(&self, root_id: &str, scope: &EntryScope) -> Result<Resolved> {
        let key = self.key(root_id);
        self.rebuild(root_id, key, scope).await
    }

    async fn rebuild(&self, root_id: &str, key: CacheKey, scope: &EntryScope) -> Result<Resolved> {
        let item = match tokio::time::timeout(self.timeout, self.builder.build(root_id)).await {
            Ok(built) => built?,
            Err(_) => {
                tracing::warn!(after_ms = self.timeout.as_millis() as u64, "Hierarchy build timed out");
                exn::bail!(ErrorKind::Timeout {
                    root_id: root_id.to_string(),
                    after: self.timeout,
                });
            },
        };
        let mut scope = scope.clone();
        scope.folder_id.get_or_insert_with(|| root_id.to_string());
        let changed = self.store.put_json(&key, &item, &scope).await.or_raise(|| ErrorKind::Cache)?;
        tracing::info!(key = %key, items = item.count(), changed, "Cached hierarchy");
        Ok(Resolved {
            item,
            source: Source::Built,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildOptions;
    use std::sync::Arc;
    use trellis_cache::{Database, Invalidation};
    use trellis_provider::RawNode;
    use trellis_provider::backend::MockProvider;

    struct Fixture {
        _db: Database,
        provider: Arc<MockProvider>,
        store: CacheStore,
        resolver: Resolver,
    }

    async fn fixture(provider: MockProvider, timeout: Duration) -> Fixture {
        let db = Database::connect_in_memory().await.unwrap();
        let provider = Arc::new(provider);
        let store = CacheStore::from(&db);
        let builder = HierarchyBuilder::new(provider.clone(), BuildOptions::default());
        let resolver = Resolver::new(builder, store.clone(), timeout);
        Fixture {
            _db: db,
            provider,
            store,
            resolver,
        }
    }

    fn portal() -> MockProvider {
        MockProvider::with_nodes([
            RawNode::folder("root", "Portal"),
            RawNode::folder("tab", "01_Resources").with_parent("root"),
            RawNode::new("doc", "0005_poster.pdf", "application/pdf").with_parent("tab"),
        ])
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let f = fixture(portal(), Duration::from_secs(5)).await;
        let first = f.resolver.resolve("root", &EntryScope::default()).await.unwrap();
        assert_eq!(first.source, Source::Built);
        assert_eq!(f.provider.list_calls(), 2);

        let second = f.resolver.resolve("root", &EntryScope::default()).await.unwrap();
        assert_eq!(second.source, Source::Cache);
        assert_eq!(second.item, first.item);
        assert_eq!(f.provider.list_calls(), 2);

        let entry = f.store.entry(&f.resolver.key("root")).await.unwrap().unwrap();
        assert_eq!(entry.access_count, 1);
    }

    #[tokio::test]
    async fn test_scope_folder_defaults_to_root() {
        let f = fixture(portal(), Duration::from_secs(5)).await;
        f.resolver.resolve("root", &EntryScope::default()).await.unwrap();
        let entry = f.store.entry(&f.resolver.key("root")).await.unwrap().unwrap();
        assert_eq!(entry.folder_id.as_deref(), Some("root"));
        assert_eq!(f.store.invalidate(&Invalidation::Folder("root".to_string())).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_explicit_scope_is_kept() {
        let f = fixture(portal(), Duration::from_secs(5)).await;
        let mapping = f.store.register_mapping("resources", "es", "root").await.unwrap();
        let scope = EntryScope::folder("tab").with_mapping(mapping.id);
        f.resolver.resolve("root", &scope).await.unwrap();
        let entry = f.store.entry(&f.resolver.key("root")).await.unwrap().unwrap();
        assert_eq!(entry.folder_id.as_deref(), Some("tab"));
        assert_eq!(entry.mapping_id, Some(mapping.id));
    }

    #[tokio::test]
    async fn test_refresh_rebuilds() {
        let f = fixture(portal(), Duration::from_secs(5)).await;
        f.resolver.resolve("root", &EntryScope::default()).await.unwrap();
        f.provider
            .insert(RawNode::new("new", "notes.txt", "text/plain").with_parent("root"))
            .await;

        let cached = f.resolver.resolve("root", &EntryScope::default()).await.unwrap();
        assert_eq!(cached.item.children.len(), 1);

        let refreshed = f.resolver.refresh("root", &EntryScope::default()).await.unwrap();
        assert_eq!(refreshed.source, Source::Built);
        assert_eq!(refreshed.item.children.len(), 2);
        let cached = f.resolver.resolve("root", &EntryScope::default()).await.unwrap();
        assert_eq!(cached.item, refreshed.item);

        f.provider.remove("doc").await.unwrap();
        let refreshed = f.resolver.refresh("root", &EntryScope::default()).await.unwrap();
        assert_eq!(refreshed.item.find(&["Resources"]).map(|tab| tab.children.len()), Some(0));
    }

    #[tokio::test]
    async fn test_timeout_writes_nothing() {
        let provider = portal().with_latency("tab", Duration::from_millis(200));
        let f = fixture(provider, Duration::from_millis(20)).await;
        let err = f.resolver.resolve("root", &EntryScope::default()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Timeout { root_id, .. } if root_id == "root"));
        assert!(err.is_retryable());
        assert_eq!(f.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_writes_nothing() {
        let f = fixture(portal().with_failure("tab", "quota exceeded"), Duration::from_secs(5)).await;
        let err = f.resolver.resolve("root", &EntryScope::default()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Provider { id } if id == "tab"));
        assert_eq!(f.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_payload_is_rebuilt() {
        let f = fixture(portal(), Duration::from_secs(5)).await;
        let key = f.resolver.key("root");
        f.store.put(&key, "{not json", &EntryScope::default()).await.unwrap();

        let resolved = f.resolver.resolve("root", &EntryScope::default()).await.unwrap();
        assert_eq!(resolved.source, Source::Built);
        assert_eq!(resolved.item.find(&["Resources", "poster.pdf"]).map(|i| i.order), Some(Some(5)));
        let cached = f.resolver.resolve("root", &EntryScope::default()).await.unwrap();
        assert_eq!(cached.source, Source::Cache);
    }

    #[tokio::test]
    async fn test_providers_do_not_share_entries() {
        let db = Database::connect_in_memory().await.unwrap();
        let store = CacheStore::from(&db);
        let resolver = |provider: MockProvider| {
            let builder = HierarchyBuilder::new(Arc::new(provider), BuildOptions::default());
            Resolver::new(builder, store.clone(), Duration::from_secs(5))
        };
        let first = resolver(
            MockProvider::with_nodes([
                RawNode::folder("root", "A"),
                RawNode::new("alpha", "alpha.pdf", "application/pdf").with_parent("root"),
            ])
            .with_name("/srv/a"),
        );
        let second = resolver(
            MockProvider::with_nodes([
                RawNode::folder("root", "B"),
                RawNode::new("beta", "beta.pdf", "application/pdf").with_parent("root"),
                RawNode::new("gamma", "gamma.pdf", "application/pdf").with_parent("root"),
            ])
            .with_name("/srv/b"),
        );

        let a = first.resolve("root", &EntryScope::default()).await.unwrap();
        let b = second.resolve("root", &EntryScope::default()).await.unwrap();
        assert_eq!(b.source, Source::Built);
        let names: Vec<&str> = b.item.children.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, ["beta.pdf", "gamma.pdf"]);
        assert_eq!(first.resolve("root", &EntryScope::default()).await.unwrap().item, a.item);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_build_options_are_part_of_the_key() {
        let f = fixture(portal(), Duration::from_secs(5)).await;
        f.resolver.resolve("root", &EntryScope::default()).await.unwrap();

        let options = BuildOptions {
            max_depth: 1,
            ..BuildOptions::default()
        };
        let shallow = Resolver::new(
            HierarchyBuilder::new(f.provider.clone(), options),
            f.store.clone(),
            Duration::from_secs(5),
        );
        assert_ne!(shallow.key("root"), f.resolver.key("root"));
        let resolved = shallow.resolve("root", &EntryScope::default()).await.unwrap();
        assert_eq!(resolved.source, Source::Built);
        assert_eq!(resolved.item.children[0].terminated, Some(crate::Terminated::Depth));
        assert_eq!(f.store.count().await.unwrap(), 2);
        let expected = format!("hierarchy:mock:root:{}", BuildOptions::default().fingerprint());
        assert_eq!(f.resolver.key("root").to_string(), expected);
    }
}
