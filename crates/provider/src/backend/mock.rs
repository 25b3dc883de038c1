//! In-memory provider for testing.

use super::NodeStream;
use crate::Provider;
use crate::error::{ErrorKind, Result};
use crate::models::RawNode;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tree {
    nodes: HashMap<String, RawNode>,
    /// Child ids per folder id, in insertion order.
    children: HashMap<String, Vec<String>>,
}
impl Tree {
    fn insert(&mut self, node: RawNode) {
        if let Some(parent) = &node.parent_id {
            let siblings = self.children.entry(parent.clone()).or_default();
            if !siblings.contains(&node.id) {
                siblings.push(node.id.clone());
            }
        }
        self.nodes.insert(node.id.clone(), node);
    }
}

/// Decrements the in-flight counter when a call finishes or is cancelled.
struct InFlight<'a>(&'a AtomicUsize);
impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory provider for testing.
///
/// Children are enumerated in insertion order. Extra parent/child links can
/// be added with [`with_link()`](Self::with_link) to build graphs a real
/// single-parent tree cannot express, such as a folder that contains one of
/// its own ancestors. Failures and latency can be injected per node id, and
/// call counters let tests assert how much work a caller did.
///
/// # Examples
///
/// ```
/// use trellis_provider::{Provider, RawNode, backend::MockProvider};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = MockProvider::with_nodes([
///     RawNode::folder("root", "Root"),
///     RawNode::new("a", "01_poster.pdf", "application/pdf").with_parent("root"),
/// ]);
/// assert_eq!(provider.list_children("root").await?.len(), 1);
/// assert_eq!(provider.list_calls(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockProvider {
    name: String,
    tree: RwLock<Tree>,
    failures: HashMap<String, String>,
    latency: HashMap<String, Duration>,
    default_latency: Duration,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockProvider {
    /// Create a mock provider pre-populated with nodes.
    ///
    /// Each node is linked under its `parent_id`. Panics on a duplicate id:
    /// if test setup is wrong, the test should not pass.
    pub fn with_nodes(nodes: impl IntoIterator<Item = RawNode>) -> Self {
        let mut tree = Tree::default();
        for node in nodes {
            if tree.nodes.contains_key(&node.id) {
                panic!("MockProvider::with_nodes: duplicate node id {}", node.id);
            }
            tree.insert(node);
        }
        Self {
            name: "mock".to_string(),
            tree: RwLock::new(tree),
            failures: HashMap::new(),
            latency: HashMap::new(),
            default_latency: Duration::ZERO,
            get_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Additionally list `child_id` under `parent_id`.
    pub fn with_link(mut self, parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        self.tree
            .get_mut()
            .children
            .entry(parent_id.into())
            .or_default()
            .push(child_id.into());
        self
    }

    /// Every call touching `id` fails with a [`Backend`](ErrorKind::Backend) error.
    pub fn with_failure(mut self, id: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(id.into(), message.into());
        self
    }

    /// Every call touching `id` sleeps for `latency` first.
    pub fn with_latency(mut self, id: impl Into<String>, latency: Duration) -> Self {
        self.latency.insert(id.into(), latency);
        self
    }

    /// Latency for ids without their own [`with_latency()`](Self::with_latency).
    pub fn with_default_latency(mut self, latency: Duration) -> Self {
        self.default_latency = latency;
        self
    }

    /// Add or replace a node after construction.
    pub async fn insert(&self, node: RawNode) {
        self.tree.write().await.insert(node);
    }

    /// Remove a node and every link pointing at it.
    pub async fn remove(&self, id: &str) -> Option<RawNode> {
        let mut tree = self.tree.write().await;
        for siblings in tree.children.values_mut() {
            siblings.retain(|child| child != id);
        }
        tree.nodes.remove(id)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    async fn simulate(&self, id: &str) -> Result<()> {
        let latency = self.latency.get(id).copied().unwrap_or(self.default_latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match self.failures.get(id) {
            Some(message) => exn::bail!(ErrorKind::Backend(message.clone())),
            None => Ok(()),
        }
    }
}
impl Default for MockProvider {
    fn default() -> Self {
        Self::with_nodes([])
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_node(&self, id: &str) -> Result<RawNode> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.enter();
        self.simulate(id).await?;
        let tree = self.tree.read().await;
        match tree.nodes.get(id) {
            Some(node) => Ok(node.clone()),
            None => exn::bail!(ErrorKind::NotFound(id.to_string())),
        }
    }

    fn children_stream<'a>(&'a self, folder_id: &'a str) -> NodeStream<'a> {
        Box::pin(stream! {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let _guard = self.enter();
            if let Err(e) = self.simulate(folder_id).await {
                yield Err(e);
                return;
            }
            // Snapshot under the read lock, then drop it before yielding.
            let children: Result<Vec<RawNode>> = {
                let tree = self.tree.read().await;
                match tree.nodes.get(folder_id) {
                    None => Err(ErrorKind::NotFound(folder_id.to_string()).into()),
                    Some(folder) if !folder.is_folder() => Err(ErrorKind::NotAFolder(folder_id.to_string()).into()),
                    Some(_) => Ok(tree
                        .children
                        .get(folder_id)
                        .into_iter()
                        .flatten()
                        .filter_map(|child| tree.nodes.get(child).cloned())
                        .collect()),
                }
            };
            match children {
                Ok(children) => {
                    for child in children {
                        yield Ok(child);
                    }
                },
                Err(e) => yield Err(e),
            }
        })
    }
}
