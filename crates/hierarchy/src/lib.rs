//! Hierarchy resolution.
//!
//! Turns a provider folder into a [`HierarchyItem`] tree: every node decoded
//! for rendering, siblings resolved concurrently and ordered deterministically,
//! cycles and runaway depth cut off as terminated branches.
//!
//! # Architecture
//! - [`HierarchyBuilder`] walks the provider with bounded parallelism.
//! - [`Resolver`] puts the builder behind the SQLite cache, with a time limit
//!   on every build.

pub mod builder;
pub mod error;
mod item;
pub mod resolve;
mod sections;

pub use crate::builder::{BuildOptions, CycleKey, HierarchyBuilder};
pub use crate::item::{Flatten, HierarchyItem, NodeType, Terminated};
pub use crate::resolve::{Resolved, Resolver, Source};
