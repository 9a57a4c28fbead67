use std::sync::Arc;

use axum::{
    http::{Method, StatusCode},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::MetadataProxy,
};

pub mod debug;
pub mod person;
pub mod search;
pub mod tmdb;

/// Shared application state
pub struct AppState {
    pub proxy: Arc<MetadataProxy>,
    pub config: Config,
}

impl AppState {
    pub fn new(proxy: Arc<MetadataProxy>, config: Config) -> Self {
        Self { proxy, config }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET]),
                ),
        )
        .with_state(state)
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tmdb/*path", get(tmdb::proxy))
        .route("/search/suggest", get(search::suggest))
        .route("/person/:id/images", get(person::images))
        .route("/person/:id/videos", get(person::videos))
        .route("/debug/env", get(debug::env))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
