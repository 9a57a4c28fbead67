use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Paginated, PersonVideo},
    routes::AppState,
    services::person::{self, IMAGE_PAGES, VIDEO_PAGES},
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

/// Handler for a person's profile images
pub async fn images(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<Paginated<Value>>> {
    let (page, page_size) =
        IMAGE_PAGES.resolve(params.page.as_deref(), params.page_size.as_deref());
    let images = person::person_images(&state.proxy, &id, page, page_size).await?;
    Ok(Json(images))
}

/// Handler for videos from a person's popular credits
pub async fn videos(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<Paginated<PersonVideo>>> {
    let (page, page_size) =
        VIDEO_PAGES.resolve(params.page.as_deref(), params.page_size.as_deref());
    let videos = person::person_videos(state.proxy.clone(), &id, page, page_size).await?;
    Ok(Json(videos))
}
