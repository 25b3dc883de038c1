use super::count;
use crate::error::Error;
use serde::Serialize;

/// Size and usage of the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: u64,
    pub total_access_count: u64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct StatsRow {
    pub(crate) entries: i64,
    pub(crate) total_access_count: i64,
    pub(crate) oldest_updated_at: Option<i64>,
    pub(crate) newest_updated_at: Option<i64>,
}
impl TryFrom<&StatsRow> for CacheStats {
    type Error = Error;
    fn try_from(row: &StatsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            entries: count(row.entries, "entry count")?,
            total_access_count: count(row.total_access_count, "access count")?,
        })
    }
}
