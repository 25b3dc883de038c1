//! Keyed payload storage.
//!
//! Every read that hits bumps the entry's access count and refreshes its
//! `updated_at`; both eviction policies in [`Maintainer`](crate::Maintainer)
//! key off those two columns.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::key::{CacheKey, Invalidation};
use crate::models::{CacheEntry, CacheStats, EntryRow, RouteMapping, StatsRow};
use exn::{OptionExt, ResultExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::instrument;

/// Optional associations recorded alongside a payload, used by
/// folder- and route-based invalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryScope {
    pub folder_id: Option<String>,
    pub mapping_id: Option<i64>,
}
impl EntryScope {
    pub fn folder(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: Some(folder_id.into()),
            mapping_id: None,
        }
    }

    pub fn with_mapping(mut self, mapping_id: i64) -> Self {
        self.mapping_id = Some(mapping_id);
        self
    }
}

/// Persistent keyed cache of serialized payloads.
///
/// In dry-run mode nothing is written: reads don't touch access counters,
/// `put` only reports whether the payload would change, and mutations run
/// inside a transaction that is rolled back, so they still report accurate
/// counts.
#[derive(Debug, Clone)]
pub struct CacheStore {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for CacheStore {
    fn from(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            dry_run: false,
        }
    }
}
impl CacheStore {
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn now() -> i64 {
        UtcDateTime::now().unix_timestamp()
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Fetch a payload, recording the access.
    ///
    /// The counter increment, the `updated_at` refresh and the read happen in
    /// one statement, so concurrent readers never lose an increment.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        let payload = match self.dry_run {
            true => self.entry(key).await?.map(|entry| entry.payload),
            false => sqlx::query_scalar(include_str!("../queries/touch_entry.sql"))
                .bind(Self::now())
                .bind(key.to_string())
                .fetch_optional(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?,
        };
        match payload {
            Some(_) => tracing::debug!("Cache hit"),
            None => tracing::debug!("Cache miss"),
        }
        Ok(payload)
    }

    /// Fetch and deserialize a JSON payload, recording the access.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        self.get(key)
            .await?
            .map(|payload| serde_json::from_str(&payload).or_raise(|| ErrorKind::InvalidData("payload")))
            .transpose()
    }

    /// Fetch a full entry without recording an access.
    pub async fn entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(include_str!("../queries/get_entry.sql"))
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(CacheEntry::try_from).transpose()
    }

    // =========================================================================
    // Write
    // =========================================================================

    /// Insert or replace a payload.
    ///
    /// Replacing keeps the entry's access count and creation date. Returns
    /// `true` if the stored payload changed (always `true` for a new key).
    #[instrument(skip_all, fields(key = %key, length = payload.len()))]
    pub async fn put(&self, key: &CacheKey, payload: &str, scope: &EntryScope) -> Result<bool> {
        let key = key.to_string();
        let hash = blake3::hash(payload.as_bytes()).to_hex().to_string();
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let previous: Option<String> = sqlx::query_scalar(include_str!("../queries/get_payload_hash.sql"))
            .bind(&key)
            .fetch_optional(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let changed = previous.as_deref() != Some(hash.as_str());
        if self.dry_run {
            tx.rollback().await.or_raise(|| ErrorKind::Database)?;
            tracing::info!(changed, "Dry run: skipping cache write");
            return Ok(changed);
        }
        sqlx::query(include_str!("../queries/upsert_entry.sql"))
            .bind(&key)
            .bind(scope.mapping_id)
            .bind(scope.folder_id.as_deref())
            .bind(payload)
            .bind(&hash)
            .bind(Self::now())
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(changed, "Stored cache entry");
        Ok(changed)
    }

    /// Serialize `value` as JSON and [`put()`](Self::put) it.
    pub async fn put_json<T: Serialize>(&self, key: &CacheKey, value: &T, scope: &EntryScope) -> Result<bool> {
        let payload = serde_json::to_string(value).or_raise(|| ErrorKind::InvalidData("payload"))?;
        self.put(key, &payload, scope).await
    }

    /// Delete every entry matching `criteria`, returning how many were deleted.
    ///
    /// A [`Route`](Invalidation::Route) naming a mapping that doesn't exist is
    /// an error ([`MappingNotFound`](ErrorKind::MappingNotFound)); a
    /// [`RouteType`](Invalidation::RouteType) matching no mappings simply
    /// deletes nothing.
    #[instrument(skip_all, fields(criteria = %criteria, dry_run = self.dry_run))]
    pub async fn invalidate(&self, criteria: &Invalidation) -> Result<u64> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let result = match criteria {
            Invalidation::Key(key) => {
                sqlx::query(include_str!("../queries/delete_by_key.sql"))
                    .bind(key.to_string())
                    .execute(&mut *tx)
                    .await
            },
            Invalidation::Folder(folder_id) => {
                sqlx::query(include_str!("../queries/delete_by_folder.sql"))
                    .bind(folder_id.as_str())
                    .execute(&mut *tx)
                    .await
            },
            Invalidation::Route {
                route_type,
                route_subtype,
            } => {
                let mapping: Option<RouteMapping> = sqlx::query_as(include_str!("../queries/find_mapping.sql"))
                    .bind(route_type.as_str())
                    .bind(route_subtype.as_str())
                    .fetch_optional(&mut *tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
                let mapping = mapping.ok_or_raise(|| ErrorKind::MappingNotFound {
                    route_type: route_type.clone(),
                    route_subtype: route_subtype.clone(),
                })?;
                sqlx::query(include_str!("../queries/delete_by_mapping.sql"))
                    .bind(mapping.id)
                    .execute(&mut *tx)
                    .await
            },
            Invalidation::RouteType(route_type) => {
                sqlx::query(include_str!("../queries/delete_by_route_type.sql"))
                    .bind(route_type.as_str())
                    .execute(&mut *tx)
                    .await
            },
        }
        .or_raise(|| ErrorKind::Database)?;
        let deleted = result.rows_affected();
        if self.dry_run {
            tx.rollback().await.or_raise(|| ErrorKind::Database)?;
            tracing::info!(deleted, "Dry run: cache entries not invalidated");
        } else {
            tx.commit().await.or_raise(|| ErrorKind::Database)?;
            tracing::info!(deleted, "Invalidated cache entries");
        }
        Ok(deleted)
    }

    // =========================================================================
    // Route mappings
    // =========================================================================

    /// Create a route mapping, or re-point an existing one at a new folder.
    #[instrument(skip(self))]
    pub async fn register_mapping(&self, route_type: &str, route_subtype: &str, folder_id: &str) -> Result<RouteMapping> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let mapping: RouteMapping = sqlx::query_as(include_str!("../queries/upsert_mapping.sql"))
            .bind(route_type)
            .bind(route_subtype)
            .bind(folder_id)
            .bind(Self::now())
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match self.dry_run {
            true => tx.rollback().await.or_raise(|| ErrorKind::Database)?,
            false => tx.commit().await.or_raise(|| ErrorKind::Database)?,
        }
        Ok(mapping)
    }

    pub async fn find_mapping(&self, route_type: &str, route_subtype: &str) -> Result<Option<RouteMapping>> {
        sqlx::query_as(include_str!("../queries/find_mapping.sql"))
            .bind(route_type)
            .bind(route_subtype)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// All mappings sharing a route type, ordered by subtype.
    pub async fn mappings_for_route_type(&self, route_type: &str) -> Result<Vec<RouteMapping>> {
        sqlx::query_as(include_str!("../queries/list_mappings_by_route_type.sql"))
            .bind(route_type)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Counts
    // =========================================================================

    pub async fn count(&self) -> Result<u64> {
        Ok(self.stats().await?.entries)
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        let row: StatsRow = sqlx::query_as(include_str!("../queries/stats.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        CacheStats::try_from(&row)
    }
}
