use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::AppResult,
    routes::AppState,
    services::search::{self, SuggestParams},
};

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    query: Option<String>,
    q: Option<String>,
    page: Option<String>,
    include_adult: Option<String>,
}

impl From<SuggestQuery> for SuggestParams {
    fn from(raw: SuggestQuery) -> Self {
        Self {
            query: raw
                .query
                .filter(|q| !q.is_empty())
                .or(raw.q)
                .unwrap_or_default(),
            page: raw.page.unwrap_or_else(|| "1".to_string()),
            include_adult: raw.include_adult.unwrap_or_else(|| "false".to_string()),
        }
    }
}

/// Handler for search suggestions
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SuggestQuery>,
) -> AppResult<Json<Value>> {
    let results = search::suggest(&state.proxy, &params.into()).await?;
    Ok(Json(json!({ "results": results })))
}
