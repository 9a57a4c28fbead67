use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB v3 API key, sent as the `api_key` query parameter
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// Legacy name for the v3 key, kept for existing deployments
    #[serde(default)]
    pub vite_tmdb_api_key: Option<String>,

    /// TMDB v4 read access token, sent as a bearer token
    #[serde(default)]
    pub tmdb_access_token: Option<String>,

    /// Redis connection URL
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Upstash Redis connection URL, used when `REDIS_URL` is unset
    #[serde(default)]
    pub upstash_redis_url: Option<String>,

    #[serde(default)]
    pub app_env: RuntimeMode,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_base_url")]
    pub tmdb_base_url: String,

    /// Directory holding the on-disk response cache
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Whether the service runs with development or production caching behavior
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl RuntimeMode {
    pub fn is_production(self) -> bool {
        self == RuntimeMode::Production
    }
}

/// Credential attached to every upstream call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// v3 key passed in the query string
    ApiKey(String),
    /// v4 token passed in the `Authorization` header
    BearerToken(String),
}

/// The raw credential settings, resolved into a [`Credential`] per request
#[derive(Debug, Clone, Default)]
pub struct TmdbCredentials {
    pub api_key: Option<String>,
    pub access_token: Option<String>,
}

impl TmdbCredentials {
    /// Picks the credential to use, preferring the v3 key over the bearer token
    pub fn resolve(&self) -> AppResult<Credential> {
        if let Some(key) = self.api_key.clone() {
            return Ok(Credential::ApiKey(key));
        }
        if let Some(token) = self.access_token.clone() {
            return Ok(Credential::BearerToken(token));
        }
        Err(AppError::Configuration)
    }
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache/tmdb")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Treats an empty or whitespace-only variable the same as an unset one
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            vite_tmdb_api_key: None,
            tmdb_access_token: None,
            redis_url: None,
            upstash_redis_url: None,
            app_env: RuntimeMode::default(),
            tmdb_base_url: default_tmdb_base_url(),
            cache_dir: default_cache_dir(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Credential settings with empty variables filtered out
    pub fn credentials(&self) -> TmdbCredentials {
        TmdbCredentials {
            api_key: non_empty(&self.tmdb_api_key).or_else(|| non_empty(&self.vite_tmdb_api_key)),
            access_token: non_empty(&self.tmdb_access_token),
        }
    }

    /// Shared cache connection string, if one is configured
    pub fn shared_cache_url(&self) -> Option<String> {
        non_empty(&self.redis_url).or_else(|| non_empty(&self.upstash_redis_url))
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
