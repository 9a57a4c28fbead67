use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::routes::AppState;

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Reports which configuration variables are set, never their values
pub async fn env(State(state): State<Arc<AppState>>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "TMDB_API_KEY_present": present(&config.tmdb_api_key),
        "VITE_TMDB_API_KEY_present": present(&config.vite_tmdb_api_key),
        "TMDB_ACCESS_TOKEN_present": present(&config.tmdb_access_token),
        "REDIS_URL_present": present(&config.redis_url),
        "UPSTASH_REDIS_URL_present": present(&config.upstash_redis_url),
        "runtime_mode": config.app_env,
    }))
}
