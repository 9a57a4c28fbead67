use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Longest slice of an upstream error body echoed back to the caller
const UPSTREAM_BODY_PREVIEW: usize = 500;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("TMDB credentials not configured")]
    Configuration,

    #[error("TMDB upstream error {status}")]
    Upstream { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Short diagnostic for the upstream statuses callers most often trip over
pub fn upstream_hint(status: u16) -> Option<&'static str> {
    match status {
        401 => Some("Invalid TMDB credentials: check TMDB_API_KEY / TMDB_ACCESS_TOKEN"),
        404 => Some("Invalid path or parameters"),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Configuration => {
                let body = Json(json!({
                    "error": self.to_string(),
                    "hint": "Set TMDB_API_KEY (v3) or TMDB_ACCESS_TOKEN (v4) in the environment or .env",
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            AppError::Upstream { status, body } => {
                let preview: String = body.chars().take(UPSTREAM_BODY_PREVIEW).collect();
                let mut payload = json!({
                    "error": "TMDB upstream error",
                    "status": status,
                    "body": preview,
                });
                if let Some(hint) = upstream_hint(status) {
                    payload["hint"] = json!(hint);
                }
                (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
            }
            AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::HttpClient(_)
            | AppError::Json(_)
            | AppError::Io(_)
            | AppError::Cache(_)
            | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_upstream_hint_known_statuses() {
        assert!(upstream_hint(401).unwrap().contains("credentials"));
        assert_eq!(upstream_hint(404), Some("Invalid path or parameters"));
        assert_eq!(upstream_hint(503), None);
    }

    #[tokio::test]
    async fn test_configuration_error_is_500_with_hint() {
        let response = AppError::Configuration.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "TMDB credentials not configured");
        assert!(body["hint"].as_str().unwrap().contains("TMDB_API_KEY"));
    }

    #[tokio::test]
    async fn test_upstream_error_maps_to_bad_gateway() {
        let response = AppError::Upstream {
            status: 404,
            body: r#"{"status_message":"not found"}"#.to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "TMDB upstream error");
        assert_eq!(body["status"], 404);
        assert_eq!(body["hint"], "Invalid path or parameters");
    }

    #[tokio::test]
    async fn test_upstream_error_truncates_body_and_omits_unknown_hint() {
        let response = AppError::Upstream {
            status: 503,
            body: "x".repeat(2000),
        }
        .into_response();

        let body = body_json(response).await;
        assert_eq!(body["body"].as_str().unwrap().len(), 500);
        assert!(body.get("hint").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_is_500_with_message() {
        let response = AppError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error: boom");
    }
}
