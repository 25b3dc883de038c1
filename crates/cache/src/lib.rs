//! SQLite cache for resolved hierarchies.
//!
//! The cache is never the source of truth: every payload can be rebuilt from
//! the provider, so losing the database only costs rebuild time.
//!
//! # Architecture
//! - [`CacheStore`] reads and writes payloads by [`CacheKey`], and deletes
//!   them by key, folder or route ([`Invalidation`]).
//! - [`Maintainer`] evicts stale and rarely used entries.
//! - Route mappings tie portal routes to provider folders. They belong to the
//!   surrounding application; the cache only reads them to resolve
//!   route-based invalidation.

mod db;
pub mod error;
mod key;
mod maintain;
mod models;
mod store;

pub use crate::db::Database;
pub use crate::key::{CacheKey, Invalidation};
pub use crate::maintain::{CleanupPolicy, CleanupStats, Maintainer};
pub use crate::models::{CacheEntry, CacheStats, RouteMapping};
pub use crate::store::{CacheStore, EntryScope};
