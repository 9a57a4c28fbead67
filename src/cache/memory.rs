use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::{CacheKey, CacheTier};
use crate::{error::AppResult, models::CacheEntry};

/// Process-local cache tier backed by a concurrent map
///
/// Lost on restart. Entries are only removed by [`MemoryCache::sweep_expired`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops entries that can no longer be served, returning how many were removed
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait::async_trait]
impl CacheTier for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    async fn try_write(&self, key: &CacheKey, entry: &CacheEntry) -> AppResult<()> {
        self.entries.insert(key.clone(), entry.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
