use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::STALE_TTL_SECS,
    routes::AppState,
    services::{ProxyResponse, Served},
};

/// Response header marking a shared-cache hit
const X_CACHE: &str = "x-cache";

/// Handler for `GET /api/tmdb/*path`
pub async fn proxy(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(path): Path<String>,
    Query(query): Query<BTreeMap<String, String>>,
) -> AppResult<Response> {
    let response = state.proxy.fetch_resource(&path, &query).await?;

    tracing::info!(
        request_id = %request_id,
        path = %path,
        served = ?response.served,
        "TMDB request served"
    );

    let production = state.proxy.mode().is_production();
    Ok(into_http_response(response, production))
}

/// Builds the 200 response with the headers describing how it was served
fn into_http_response(response: ProxyResponse, production: bool) -> Response {
    let mut headers = HeaderMap::new();

    match &response.served {
        Served::SharedCache => {
            headers.insert(X_CACHE, HeaderValue::from_static("redis"));
        }
        Served::Upstream if production => {
            let directive = format!(
                "public, s-maxage={ttl}, stale-while-revalidate={ttl}",
                ttl = STALE_TTL_SECS
            );
            if let Ok(value) = HeaderValue::from_str(&directive) {
                headers.insert(header::CACHE_CONTROL, value);
            }
        }
        Served::Upstream => {}
        Served::Stale { .. } => {
            if let Some(value) = response
                .served
                .warning()
                .and_then(|w| HeaderValue::from_str(&w).ok())
            {
                headers.insert(header::WARNING, value);
            }
        }
    }

    (headers, Json(response.data)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::proxy::{StaleReason, StaleTier};
    use axum::http::StatusCode;
    use serde_json::json;

    fn response(served: Served) -> ProxyResponse {
        ProxyResponse {
            data: json!({"title": "Fight Club"}),
            served,
        }
    }

    #[test]
    fn test_fresh_response_in_development_has_no_cache_headers() {
        let http = into_http_response(response(Served::Upstream), false);
        assert_eq!(http.status(), StatusCode::OK);
        assert!(http.headers().get(header::CACHE_CONTROL).is_none());
        assert!(http.headers().get(X_CACHE).is_none());
    }

    #[test]
    fn test_fresh_response_in_production_is_cacheable() {
        let http = into_http_response(response(Served::Upstream), true);
        assert_eq!(
            http.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, s-maxage=86400, stale-while-revalidate=86400"
        );
    }

    #[test]
    fn test_shared_hit_is_tagged() {
        let http = into_http_response(response(Served::SharedCache), true);
        assert_eq!(http.headers().get(X_CACHE).unwrap(), "redis");
        assert!(http.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[test]
    fn test_stale_response_carries_warning() {
        let http = into_http_response(
            response(Served::Stale {
                tier: StaleTier::Memory,
                reason: StaleReason::Upstream(502),
            }),
            true,
        );
        assert_eq!(http.status(), StatusCode::OK);
        assert_eq!(
            http.headers().get(header::WARNING).unwrap(),
            "199 - Served stale TMDB cache due to upstream 502"
        );
        assert!(http.headers().get(header::CACHE_CONTROL).is_none());
    }
}
