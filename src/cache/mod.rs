//! Cache tiers sitting in front of the TMDB API
//!
//! Tier 0 is the in-process [`MemoryCache`], tier 1 the on-disk [`DiskCache`],
//! tier 2 the shared Redis cache ([`RedisCache`], or [`DisabledCache`] when no
//! Redis URL is configured). Tiers are independent: nothing propagates writes
//! or invalidations between them, and another instance's Redis writes only
//! reach this instance's memory and disk tiers on its next successful fetch.

use crate::{error::AppResult, models::CacheEntry};

pub mod disk;
pub mod key;
pub mod memory;
pub mod shared;

pub use disk::DiskCache;
pub use key::CacheKey;
pub use memory::MemoryCache;
pub use shared::{shared_tier, CacheWriterHandle, DisabledCache, RedisCache};

/// A key-value store holding [`CacheEntry`] documents
///
/// Reads never fail: a tier that cannot answer reports a miss and logs why.
/// Writes are advisory. `try_write` reports failure so it can be logged, but
/// callers are free to drop the result and must never fail a request on it.
#[async_trait::async_trait]
pub trait CacheTier: Send + Sync {
    /// Returns the entry stored under `key`, whatever its age
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Stores `entry` under `key`, replacing any previous entry
    async fn try_write(&self, key: &CacheKey, entry: &CacheEntry) -> AppResult<()>;

    /// Tier name for logging
    fn name(&self) -> &'static str;
}
