//! Cache eviction.
//!
//! Two independent policies, applied together:
//! - **staleness**: entries not read or written for `max_age_days`;
//! - **low usage**: entries read fewer than `low_usage_threshold` times and
//!   idle for `low_usage_age_days`.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{StatsRow, count};
use exn::ResultExt;
use serde::Serialize;
use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::instrument;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_MINUTE: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    pub max_age_days: u32,
    pub low_usage_threshold: u32,
    pub low_usage_age_days: u32,
}
impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            max_age_days: 7,
            low_usage_threshold: 3,
            low_usage_age_days: 2,
        }
    }
}

/// Outcome of one cleanup run.
///
/// Entries matching both policies are counted once, as stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStats {
    pub total_removed: u64,
    pub stale_removed: u64,
    pub low_usage_removed: u64,
    pub remaining_count: u64,
    /// Whole days since the least recently used remaining entry was touched.
    pub oldest_remaining_age_days: Option<i64>,
    /// Whole minutes since the most recently used remaining entry was touched.
    pub newest_remaining_age_minutes: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Maintainer {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for Maintainer {
    fn from(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            dry_run: false,
        }
    }
}
impl Maintainer {
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run_cleanup(&self, policy: &CleanupPolicy) -> Result<CleanupStats> {
        self.run_cleanup_at(UtcDateTime::now(), policy).await
    }

    /// Apply both eviction policies as of `now`, in a single transaction.
    ///
    /// Running it twice with the same `now` removes nothing the second time.
    #[instrument(skip(self, now), fields(at = now.unix_timestamp(), dry_run = self.dry_run))]
    pub async fn run_cleanup_at(&self, now: UtcDateTime, policy: &CleanupPolicy) -> Result<CleanupStats> {
        if policy.low_usage_age_days >= policy.max_age_days {
            tracing::warn!(
                low_usage_age_days = policy.low_usage_age_days,
                max_age_days = policy.max_age_days,
                "Low-usage window is not shorter than the staleness window; low-usage eviction will never fire"
            );
        }
        let now = now.unix_timestamp();
        let stale_cutoff = now - i64::from(policy.max_age_days) * SECONDS_PER_DAY;
        let low_usage_cutoff = now - i64::from(policy.low_usage_age_days) * SECONDS_PER_DAY;

        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let stale_removed = sqlx::query(include_str!("../queries/delete_stale.sql"))
            .bind(stale_cutoff)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        let low_usage_removed = sqlx::query(include_str!("../queries/delete_low_usage.sql"))
            .bind(i64::from(policy.low_usage_threshold))
            .bind(low_usage_cutoff)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        let remaining: StatsRow = sqlx::query_as(include_str!("../queries/stats.sql"))
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match self.dry_run {
            true => tx.rollback().await.or_raise(|| ErrorKind::Database)?,
            false => tx.commit().await.or_raise(|| ErrorKind::Database)?,
        }

        let stats = CleanupStats {
            total_removed: stale_removed + low_usage_removed,
            stale_removed,
            low_usage_removed,
            remaining_count: count(remaining.entries, "entry count")?,
            oldest_remaining_age_days: remaining
                .oldest_updated_at
                .map(|updated| (now - updated).div_euclid(SECONDS_PER_DAY)),
            newest_remaining_age_minutes: remaining
                .newest_updated_at
                .map(|updated| (now - updated).div_euclid(SECONDS_PER_MINUTE)),
        };
        tracing::info!(
            total_removed = stats.total_removed,
            stale_removed,
            low_usage_removed,
            remaining = stats.remaining_count,
            "Cache cleanup finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const NOW: i64 = 1_750_000_000;
    const HOUR: i64 = 3_600;
    const DAY: i64 = SECONDS_PER_DAY;

    fn now() -> UtcDateTime {
        UtcDateTime::from_unix_timestamp(NOW).unwrap()
    }

    async fn seed(db: &Database, key: &str, access_count: i64, age_seconds: i64) {
        sqlx::query(
            "INSERT INTO cache_entries (cache_key, payload, payload_hash, access_count, created_at, updated_at)
             VALUES (?, '{}', '', ?, ?, ?)",
        )
        .bind(key)
        .bind(access_count)
        .bind(NOW - age_seconds - DAY)
        .bind(NOW - age_seconds)
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn fixture() -> Database {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db, "fresh-popular", 10, HOUR).await;
        seed(&db, "fresh-unpopular", 0, DAY).await;
        seed(&db, "idle-unpopular", 2, 3 * DAY).await;
        seed(&db, "idle-popular", 3, 3 * DAY).await;
        seed(&db, "week-old", 5, 7 * DAY).await;
        seed(&db, "stale-popular", 50, 8 * DAY).await;
        seed(&db, "stale-unpopular", 0, 10 * DAY).await;
        db
    }

    async fn keys(db: &Database) -> Vec<String> {
        sqlx::query_scalar("SELECT cache_key FROM cache_entries ORDER BY cache_key")
            .fetch_all(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_default_policy() {
        let db = fixture().await;
        let stats = Maintainer::from(&db)
            .run_cleanup_at(now(), &CleanupPolicy::default())
            .await
            .unwrap();
        assert_eq!(
            stats,
            CleanupStats {
                total_removed: 3,
                stale_removed: 2,
                low_usage_removed: 1,
                remaining_count: 4,
                oldest_remaining_age_days: Some(7),
                newest_remaining_age_minutes: Some(60),
            }
        );
        assert_eq!(keys(&db).await, ["fresh-popular", "fresh-unpopular", "idle-popular", "week-old"]);
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let db = fixture().await;
        let maintainer = Maintainer::from(&db);
        maintainer.run_cleanup_at(now(), &CleanupPolicy::default()).await.unwrap();
        let again = maintainer.run_cleanup_at(now(), &CleanupPolicy::default()).await.unwrap();
        assert_eq!(again.total_removed, 0);
        assert_eq!(again.remaining_count, 4);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let db = Database::connect_in_memory().await.unwrap();
        let stats = Maintainer::from(&db).run_cleanup(&CleanupPolicy::default()).await.unwrap();
        assert_eq!(stats, CleanupStats::default());
        assert_eq!(stats.oldest_remaining_age_days, None);
        assert_eq!(stats.newest_remaining_age_minutes, None);
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_deleting() {
        let db = fixture().await;
        let stats = Maintainer::from(&db)
            .with_dry_run(true)
            .run_cleanup_at(now(), &CleanupPolicy::default())
            .await
            .unwrap();
        assert_eq!(stats.total_removed, 3);
        assert_eq!(stats.remaining_count, 4);
        assert_eq!(keys(&db).await.len(), 7);
    }

    /// Exactly `(updatedAt < now-7d) OR (accessCount < 3 AND updatedAt < now-2d)`.
    #[rstest]
    #[case(0, 0, false)]
    #[case(0, 2 * DAY, false)]
    #[case(0, 2 * DAY + 1, true)]
    #[case(2, 2 * DAY + 1, true)]
    #[case(3, 2 * DAY + 1, false)]
    #[case(3, 7 * DAY, false)]
    #[case(3, 7 * DAY + 1, true)]
    #[case(1_000, 30 * DAY, true)]
    #[tokio::test]
    async fn test_removal_predicate(#[case] access_count: i64, #[case] age_seconds: i64, #[case] removed: bool) {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db, "entry", access_count, age_seconds).await;
        let stats = Maintainer::from(&db)
            .run_cleanup_at(now(), &CleanupPolicy::default())
            .await
            .unwrap();
        assert_eq!(stats.total_removed == 1, removed);
        assert_eq!(keys(&db).await.is_empty(), removed);
    }

    #[tokio::test]
    async fn test_overlapping_windows_still_apply_staleness() {
        let db = fixture().await;
        let policy = CleanupPolicy {
            max_age_days: 2,
            low_usage_threshold: 3,
            low_usage_age_days: 5,
        };
        let stats = Maintainer::from(&db).run_cleanup_at(now(), &policy).await.unwrap();
        assert_eq!(stats.stale_removed, 5);
        assert_eq!(stats.low_usage_removed, 0);
        assert_eq!(keys(&db).await, ["fresh-popular", "fresh-unpopular"]);
    }
}
