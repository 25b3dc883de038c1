//! Recursive hierarchy construction.
//!
//! Provider trees are snapshots of something editors change by hand, so they
//! can contain cycles (shortcuts, or a folder copied into its own subtree)
//! and arbitrarily deep nesting. Two guards keep every build finite:
//!
//! - a folder at `max_depth` is included without its children;
//! - a folder whose identity already occurs on the path from the root is
//!   included without its children.
//!
//! Either way the folder becomes a terminated branch rather than an error.
//! The ancestor path is copied into each child's task, so siblings never see
//! each other's descendants.

use crate::error::{ErrorKind, Result};
use crate::item::{HierarchyItem, Terminated};
use crate::sections::{self, Entry, Slot};
use exn::ResultExt;
use futures::future::{BoxFuture, try_join_all};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::instrument;
use trellis_provider::{ProviderHandle, RawNode};

/// What makes two folders "the same" for cycle detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleKey {
    /// Raw provider name. Catches copies of a folder inside itself.
    #[default]
    Name,
    /// Provider id. Only catches true link cycles.
    Id,
}
impl CycleKey {
    fn of<'a>(&self, node: &'a RawNode) -> &'a str {
        match self {
            Self::Name => &node.name,
            Self::Id => &node.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Deepest level that may still have children listed beneath it is
    /// `max_depth - 1`; the root is depth 0.
    pub max_depth: u32,
    /// Maximum provider calls in flight for one builder.
    pub concurrency: usize,
    pub cycle_key: CycleKey,
    /// Enables section grouping on this delimiter (usually `/`). `None` or
    /// an empty string keeps every name as-is.
    pub section_delimiter: Option<String>,
}
impl BuildOptions {
    /// Short digest of every option that changes the shape of a built tree.
    ///
    /// `concurrency` only affects how fast a tree is built, so it is left out.
    pub fn fingerprint(&self) -> String {
        let shape = format!(
            "max_depth={};cycle_key={:?};sections={:?}",
            self.max_depth,
            self.cycle_key,
            self.section_delimiter.as_deref().filter(|d| !d.is_empty())
        );
        blake3::hash(shape.as_bytes()).to_hex()[..12].to_string()
    }
}
impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_depth: 6,
            concurrency: 8,
            cycle_key: CycleKey::default(),
            section_delimiter: None,
        }
    }
}

/// Builds [`HierarchyItem`] trees from a provider.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use trellis_hierarchy::{BuildOptions, HierarchyBuilder, error::Result};
/// use trellis_provider::ProviderHandle;
///
/// async fn titles(provider: ProviderHandle, root_id: &str) -> Result<Vec<String>> {
///     let builder = HierarchyBuilder::new(provider, BuildOptions::default());
///     let root = builder.build(root_id).await?;
///     Ok(root.flatten().map(|item| item.display_name.clone()).collect())
/// }
/// ```
#[derive(Clone)]
pub struct HierarchyBuilder {
    provider: ProviderHandle,
    options: BuildOptions,
    permits: Arc<Semaphore>,
}
impl HierarchyBuilder {
    pub fn new(provider: ProviderHandle, options: BuildOptions) -> Self {
        let permits = Arc::new(Semaphore::new(options.concurrency.max(1)));
        Self {
            provider,
            options,
            permits,
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Resolve the tree rooted at `root_id`.
    ///
    /// Provider failures anywhere in the tree fail the whole build with
    /// [`ErrorKind::Provider`] naming the node whose call failed.
    #[instrument(skip(self), fields(provider = self.provider.name(), max_depth = self.options.max_depth))]
    pub async fn build(&self, root_id: &str) -> Result<HierarchyItem> {
        let root = self.fetch_node(root_id).await?;
        let item = self.resolve(Entry::from(root), 0, Vec::new()).await?;
        tracing::debug!(items = item.count(), "Built hierarchy");
        Ok(item)
    }

    async fn fetch_node(&self, id: &str) -> Result<RawNode> {
        let _permit = self.permits.acquire().await.or_raise(|| ErrorKind::Provider { id: id.to_string() })?;
        self.provider
            .get_node(id)
            .await
            .or_raise(|| ErrorKind::Provider { id: id.to_string() })
    }

    async fn fetch_children(&self, id: &str) -> Result<Vec<RawNode>> {
        let _permit = self.permits.acquire().await.or_raise(|| ErrorKind::Provider { id: id.to_string() })?;
        self.provider
            .list_children(id)
            .await
            .or_raise(|| ErrorKind::Provider { id: id.to_string() })
    }

    /// Resolve one provider node, and its subtree if it's a folder.
    ///
    /// Boxed for recursion.
    fn resolve(&self, entry: Entry, depth: u32, ancestors: Vec<String>) -> BoxFuture<'_, Result<HierarchyItem>> {
        Box::pin(async move {
            let Entry { node, name } = entry;
            let mut item = HierarchyItem::from_named(&node, &name, depth);
            if !node.is_folder() {
                return Ok(item);
            }
            let key = self.options.cycle_key.of(&node);
            if ancestors.iter().any(|ancestor| ancestor == key) {
                tracing::debug!(id = %node.id, depth, "Cycle detected, terminating branch");
                item.terminated = Some(Terminated::Cycle);
                return Ok(item);
            }
            if depth >= self.options.max_depth {
                tracing::debug!(id = %node.id, depth, "Maximum depth reached, terminating branch");
                item.terminated = Some(Terminated::Depth);
                return Ok(item);
            }
            let children = self.fetch_children(&node.id).await?;
            let mut path = ancestors;
            path.push(key.to_string());
            item.children = self
                .resolve_siblings(&node.id, children.into_iter().map(Entry::from).collect(), depth + 1, path)
                .await?;
            Ok(item)
        })
    }

    /// Resolve a synthetic section folder and its members.
    fn resolve_bucket<'a>(
        &'a self,
        parent_id: &'a str,
        segment: String,
        members: Vec<Entry>,
        depth: u32,
        ancestors: Vec<String>,
    ) -> BoxFuture<'a, Result<HierarchyItem>> {
        Box::pin(async move {
            let mut item = HierarchyItem::bucket(parent_id, &segment, depth);
            if depth >= self.options.max_depth {
                tracing::debug!(id = %item.id, depth, "Maximum depth reached, terminating section");
                item.terminated = Some(Terminated::Depth);
                return Ok(item);
            }
            let id = item.id.clone();
            item.children = self.resolve_siblings(&id, members, depth + 1, ancestors).await?;
            Ok(item)
        })
    }

    /// Resolve all siblings concurrently, then order them.
    ///
    /// Output order depends only on `order` and enumeration position, never
    /// on which provider call finished first.
    async fn resolve_siblings(
        &self,
        parent_id: &str,
        entries: Vec<Entry>,
        depth: u32,
        ancestors: Vec<String>,
    ) -> Result<Vec<HierarchyItem>> {
        let slots = sections::group(entries, self.options.section_delimiter.as_deref());
        let pending = slots.into_iter().map(|slot| match slot {
            Slot::Entry(entry) => self.resolve(entry, depth, ancestors.clone()),
            Slot::Bucket { segment, members } => {
                self.resolve_bucket(parent_id, segment, members, depth, ancestors.clone())
            },
        });
        let mut items = try_join_all(pending).await?;
        // Stable: ties keep enumeration order.
        items.sort_by_key(HierarchyItem::sort_key);
        Ok(items)
    }
}
