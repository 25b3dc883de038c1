use super::{count, timestamp};
use crate::error::Error;
use time::UtcDateTime;

/// One cached payload as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub cache_key: String,
    pub mapping_id: Option<i64>,
    pub folder_id: Option<String>,
    /// Serialized JSON.
    pub payload: String,
    /// BLAKE3 hex digest of `payload`.
    pub payload_hash: String,
    pub access_count: u64,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct EntryRow {
    cache_key: String,
    mapping_id: Option<i64>,
    folder_id: Option<String>,
    payload: String,
    payload_hash: String,
    access_count: i64,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<EntryRow> for CacheEntry {
    type Error = Error;
    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            cache_key: row.cache_key,
            mapping_id: row.mapping_id,
            folder_id: row.folder_id,
            payload: row.payload,
            payload_hash: row.payload_hash,
            access_count: count(row.access_count, "access count")?,
            created_at: timestamp(row.created_at, "creation date")?,
            updated_at: timestamp(row.updated_at, "update date")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn row(access_count: i64) -> EntryRow {
        EntryRow {
            cache_key: "hierarchy:root:6".to_string(),
            mapping_id: Some(3),
            folder_id: Some("root".to_string()),
            payload: "{}".to_string(),
            payload_hash: blake3::hash(b"{}").to_hex().to_string(),
            access_count,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_600,
        }
    }

    #[test]
    fn test_row_to_model() {
        let entry = CacheEntry::try_from(row(4)).unwrap();
        assert_eq!(entry.access_count, 4);
        assert_eq!(entry.mapping_id, Some(3));
        assert_eq!((entry.updated_at - entry.created_at).whole_minutes(), 10);
    }

    #[test]
    fn test_negative_access_count_is_invalid() {
        let err = CacheEntry::try_from(row(-1)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("access count")));
    }
}
