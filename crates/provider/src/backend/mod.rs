//! Provider trait and implementations.
//!
//! A provider is anything that can hand out a node by id and enumerate a
//! folder's direct children. Everything above this layer (hierarchy building,
//! caching) only ever talks to a [`ProviderHandle`](crate::ProviderHandle).

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalProvider;
#[cfg(feature = "mock")]
pub use self::mock::MockProvider;
use crate::error::Result;
use crate::models::RawNode;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

pub type NodeStream<'a> = Pin<Box<dyn Stream<Item = Result<RawNode>> + Send + 'a>>;

/// Unified interface over hierarchical file providers.
///
/// # Ordering
/// Children are yielded in the provider's enumeration order. Implementations
/// must keep that order stable between calls for an unchanged folder, since
/// sibling ordering downstream falls back to it.
///
/// # Examples
///
/// ```
/// use trellis_provider::{Provider, RawNode, error::Result};
///
/// async fn folder_names(provider: &dyn Provider, id: &str) -> Result<Vec<String>> {
///     Ok(provider
///         .list_children(id)
///         .await?
///         .into_iter()
///         .filter(RawNode::is_folder)
///         .map(|node| node.name)
///         .collect())
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Name of the configured provider, used for logging only.
    fn name(&self) -> &str;

    /// Fetch a single node by id.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if no node
    /// has that id.
    async fn get_node(&self, id: &str) -> Result<RawNode>;

    /// List the direct children of a folder.
    ///
    /// Default implementation collects [`children_stream()`](Self::children_stream)
    /// into a [`Vec`].
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RawNode>> {
        self.children_stream(folder_id).try_collect().await
    }

    /// Stream the direct children of a folder in enumeration order.
    ///
    /// Returns [`NotAFolder`](crate::error::ErrorKind::NotAFolder) (as the
    /// first and only item) when `folder_id` names a file.
    fn children_stream<'a>(&'a self, folder_id: &'a str) -> NodeStream<'a>;
}
