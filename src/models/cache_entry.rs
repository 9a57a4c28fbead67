use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How long a cached upstream response may be served, in seconds
pub const STALE_TTL_SECS: i64 = 24 * 60 * 60;

/// Maximum age of an entry that may still be served
pub fn stale_ttl() -> TimeDelta {
    TimeDelta::seconds(STALE_TTL_SECS)
}

/// One cached upstream response
///
/// Serialized as `{"data": ..., "storedAt": <unix millis>}` in every
/// persistent tier, so data and timestamp always travel as one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub data: Value,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Wraps a freshly fetched payload, stamped with the current time
    pub fn new(data: Value) -> Self {
        Self::stored_at(data, Utc::now())
    }

    pub fn stored_at(data: Value, stored_at: DateTime<Utc>) -> Self {
        Self { data, stored_at }
    }

    /// Time elapsed since the entry was written
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.stored_at
    }

    /// Whether the entry is still within the serving window
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.age(now) < stale_ttl()
    }
}
