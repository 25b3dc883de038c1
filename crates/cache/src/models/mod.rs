mod entry;
mod mapping;
mod stats;

pub use self::entry::CacheEntry;
pub(crate) use self::entry::EntryRow;
pub use self::mapping::RouteMapping;
pub use self::stats::CacheStats;
pub(crate) use self::stats::StatsRow;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::UtcDateTime;

pub(crate) fn timestamp(seconds: i64, field: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp(seconds).or_raise(|| ErrorKind::InvalidData(field))
}

pub(crate) fn count(value: i64, field: &'static str) -> Result<u64> {
    u64::try_from(value).or_raise(|| ErrorKind::InvalidData(field))
}
