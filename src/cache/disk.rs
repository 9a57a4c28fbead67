use std::path::{Path, PathBuf};

use tokio::fs;

use super::{CacheKey, CacheTier};
use crate::{error::AppResult, models::CacheEntry};

/// Cache tier storing one JSON document per key under a directory
///
/// Survives restarts and may be shared by several processes. There is no
/// locking: every write replaces the whole file, so concurrent writers of
/// the same key resolve to last-write-wins.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.disk_file_name())
    }

    async fn read_entry(&self, key: &CacheKey) -> AppResult<CacheEntry> {
        let raw = fs::read_to_string(self.path_for(key)).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait::async_trait]
impl CacheTier for DiskCache {
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.read_entry(key).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Disk cache miss");
                None
            }
        }
    }

    async fn try_write(&self, key: &CacheKey, entry: &CacheEntry) -> AppResult<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        let payload = serde_json::to_vec(entry)?;

        fs::write(&tmp, payload).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}
