/// Cached metadata proxy
///
/// Serves TMDB resources through four tiers: shared Redis cache, upstream
/// API, then disk and memory snapshots when the upstream fails. Only a fresh
/// Redis hit short-circuits the upstream call; the local tiers exist to
/// survive upstream trouble, not to save requests.
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use chrono::Utc;
use reqwest::Url;
use serde_json::Value;

use crate::{
    cache::{CacheKey, CacheTier},
    config::{Config, Credential, RuntimeMode, TmdbCredentials},
    error::{AppError, AppResult},
    models::CacheEntry,
    services::upstream::{Upstream, UpstreamRequest},
};

const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_REGION: &str = "IN";

/// The cache tiers consulted by the proxy
#[derive(Clone)]
pub struct CacheTiers {
    pub memory: Arc<dyn CacheTier>,
    pub disk: Arc<dyn CacheTier>,
    pub shared: Arc<dyn CacheTier>,
}

/// Which tier a stale snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleTier {
    Redis,
    Disk,
    Memory,
}

/// Why the proxy fell back to a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// TMDB answered with this non-2xx status
    Upstream(u16),
    /// The fetch failed before TMDB produced a status (network, decode, ...)
    InternalError,
}

/// How a response was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Served {
    /// Fetched from TMDB just now
    Upstream,
    /// Fresh hit in the shared cache
    SharedCache,
    /// Snapshot served because TMDB could not be used
    Stale { tier: StaleTier, reason: StaleReason },
}

impl Served {
    /// Value of the `Warning` header for stale responses
    pub fn warning(&self) -> Option<String> {
        let Served::Stale { tier, reason } = self else {
            return None;
        };
        let source = match tier {
            StaleTier::Redis => "TMDB redis cache",
            StaleTier::Disk => "TMDB disk cache",
            StaleTier::Memory => "TMDB cache",
        };
        Some(format!("199 - Served stale {} due to {}", source, reason))
    }
}

impl Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleReason::Upstream(status) => write!(f, "upstream {}", status),
            StaleReason::InternalError => write!(f, "internal error"),
        }
    }
}

/// Result of a successful proxy call
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub data: Value,
    pub served: Served,
}

pub struct MetadataProxy {
    upstream: Arc<dyn Upstream>,
    tiers: CacheTiers,
    base_url: String,
    credentials: TmdbCredentials,
    mode: RuntimeMode,
}

impl MetadataProxy {
    pub fn new(config: &Config, tiers: CacheTiers, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            tiers,
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials(),
            mode: config.app_env,
        }
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    /// Builds the canonical upstream URL for `path` and `query`
    ///
    /// Parameters are emitted sorted by name with the language/region
    /// defaults filled in, then the v3 key last, so equal requests always
    /// produce the same string.
    pub fn canonical_url(
        &self,
        path: &str,
        query: &BTreeMap<String, String>,
        credential: &Credential,
    ) -> AppResult<String> {
        let mut params = query.clone();
        params.remove("api_key");
        params
            .entry("language".to_string())
            .or_insert_with(|| DEFAULT_LANGUAGE.to_string());
        params
            .entry("region".to_string())
            .or_insert_with(|| DEFAULT_REGION.to_string());

        let raw = format!("{}/{}", self.base_url, path.trim_matches('/'));
        let mut url = Url::parse(&raw)
            .map_err(|e| AppError::Internal(format!("Invalid upstream URL {}: {}", raw, e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            pairs.extend_pairs(params.iter());
            if let Credential::ApiKey(key) = credential {
                pairs.append_pair("api_key", key);
            }
        }

        Ok(url.to_string())
    }

    /// Returns the JSON for `path`, going through the cache tiers
    #[tracing::instrument(skip(self, query))]
    pub async fn fetch_resource(
        &self,
        path: &str,
        query: &BTreeMap<String, String>,
    ) -> AppResult<ProxyResponse> {
        let credential = self.credentials.resolve()?;
        let url = self.canonical_url(path, query, &credential)?;
        let key = CacheKey::new(url.clone());

        match self.fetch_through_tiers(&key, url, credential).await {
            Ok(response) => Ok(response),
            Err(AppError::Upstream { status, body }) => {
                let fallback = [
                    (&self.tiers.disk, StaleTier::Disk),
                    (&self.tiers.memory, StaleTier::Memory),
                ];
                match self
                    .serve_stale(&key, &fallback, StaleReason::Upstream(status))
                    .await
                {
                    Some(response) => Ok(response),
                    None => {
                        tracing::warn!(status, "TMDB upstream error with no cached fallback");
                        Err(AppError::Upstream { status, body })
                    }
                }
            }
            Err(e) => {
                let fallback = [
                    (&self.tiers.shared, StaleTier::Redis),
                    (&self.tiers.disk, StaleTier::Disk),
                    (&self.tiers.memory, StaleTier::Memory),
                ];
                match self
                    .serve_stale(&key, &fallback, StaleReason::InternalError)
                    .await
                {
                    Some(response) => Ok(response),
                    None => {
                        tracing::error!(error = %e, "TMDB fetch failed with no cached fallback");
                        Err(e)
                    }
                }
            }
        }
    }

    /// Fresh shared-cache hit, otherwise an upstream fetch with write-through
    async fn fetch_through_tiers(
        &self,
        key: &CacheKey,
        url: String,
        credential: Credential,
    ) -> AppResult<ProxyResponse> {
        if let Some(entry) = self.tiers.shared.get(key).await {
            if entry.is_fresh(Utc::now()) {
                tracing::debug!("Shared cache hit");
                return Ok(ProxyResponse {
                    data: entry.data,
                    served: Served::SharedCache,
                });
            }
        }

        let bearer_token = match credential {
            Credential::BearerToken(token) => Some(token),
            Credential::ApiKey(_) => None,
        };
        let request = UpstreamRequest { url, bearer_token };
        let data = self.upstream.fetch_json(&request).await?;

        let entry = CacheEntry::new(data);
        for tier in [&self.tiers.memory, &self.tiers.disk, &self.tiers.shared] {
            write_through(tier.as_ref(), key, &entry).await;
        }

        Ok(ProxyResponse {
            data: entry.data,
            served: Served::Upstream,
        })
    }

    /// First fresh entry among `tiers`, in order
    async fn serve_stale(
        &self,
        key: &CacheKey,
        tiers: &[(&Arc<dyn CacheTier>, StaleTier)],
        reason: StaleReason,
    ) -> Option<ProxyResponse> {
        let now = Utc::now();
        for (tier, stale_tier) in tiers {
            let Some(entry) = tier.get(key).await else {
                continue;
            };
            if entry.is_fresh(now) {
                tracing::warn!(
                    tier = tier.name(),
                    reason = %reason,
                    age_secs = entry.age(now).num_seconds(),
                    "Serving stale TMDB snapshot"
                );
                return Some(ProxyResponse {
                    data: entry.data,
                    served: Served::Stale {
                        tier: *stale_tier,
                        reason,
                    },
                });
            }
        }
        None
    }
}

/// Advisory write: failures are logged and dropped
async fn write_through(tier: &dyn CacheTier, key: &CacheKey, entry: &CacheEntry) {
    if let Err(e) = tier.try_write(key, entry).await {
        tracing::warn!(tier = tier.name(), key = %key, error = %e, "Cache write failed");
    }
}
