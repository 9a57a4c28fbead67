use sha2::{Digest, Sha256};
use std::fmt::Display;

/// Cache key for one upstream resource: the canonical upstream URL
///
/// The same string is the Redis key and the pre-image of the disk filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(canonical_url: impl Into<String>) -> Self {
        Self(canonical_url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex SHA-256 digest of the key
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }

    /// File name of this key inside the disk cache directory
    pub fn disk_file_name(&self) -> String {
        format!("{}.json", self.fingerprint())
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
