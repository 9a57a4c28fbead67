/// TMDB upstream client
///
/// One GET per call, no retries: resilience comes from the cache tiers in
/// front of it, not from hammering a rate-limited API.
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::{
    config::RuntimeMode,
    error::{AppError, AppResult},
    models::STALE_TTL_SECS,
};

/// A fully built upstream call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    /// Canonical URL, credentials already in the query string for v3 keys
    pub url: String,
    /// v4 bearer token, when that is the configured credential
    pub bearer_token: Option<String>,
}

/// Source of truth for metadata requests
///
/// Non-2xx responses surface as [`AppError::Upstream`]; network and decode
/// failures as any other error variant.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch_json(&self, request: &UpstreamRequest) -> AppResult<Value>;
}

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    mode: RuntimeMode,
}

impl TmdbClient {
    pub fn new(mode: RuntimeMode) -> Self {
        Self::with_client(HttpClient::new(), mode)
    }

    pub fn with_client(http_client: HttpClient, mode: RuntimeMode) -> Self {
        Self { http_client, mode }
    }

    /// `Cache-Control` directive for outgoing requests
    ///
    /// Development always revalidates so upstream changes show up at once;
    /// production lets intermediaries reuse a response for the stale window.
    fn cache_directive(&self) -> String {
        match self.mode {
            RuntimeMode::Development => "no-cache".to_string(),
            RuntimeMode::Production => format!("max-age={}", STALE_TTL_SECS),
        }
    }
}

#[async_trait::async_trait]
impl Upstream for TmdbClient {
    async fn fetch_json(&self, request: &UpstreamRequest) -> AppResult<Value> {
        let mut builder = self
            .http_client
            .get(&request.url)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, self.cache_directive());

        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "TMDB returned an error status");
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response.json().await?;
        Ok(data)
    }
}
