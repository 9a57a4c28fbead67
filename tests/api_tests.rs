use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use grouppy_api::{
    cache::{CacheKey, CacheTier, DisabledCache, DiskCache, MemoryCache},
    config::{Config, Credential, RuntimeMode},
    routes::{create_router, AppState},
    services::{CacheTiers, MetadataProxy, TmdbClient},
};

/// A server wired to a fake TMDB, with every tier observable
struct Harness {
    server: TestServer,
    proxy: Arc<MetadataProxy>,
    memory: Arc<MemoryCache>,
    disk: Arc<DiskCache>,
    shared: Arc<MemoryCache>,
    _cache_dir: TempDir,
}

impl Harness {
    fn new(tmdb: &MockServer, config: Config) -> Self {
        Self::with_shared(tmdb, config, true)
    }

    fn with_shared(tmdb: &MockServer, config: Config, shared_enabled: bool) -> Self {
        let cache_dir = tempfile::tempdir().unwrap();
        let config = Config {
            tmdb_base_url: tmdb.uri(),
            cache_dir: cache_dir.path().to_path_buf(),
            ..config
        };

        let memory = Arc::new(MemoryCache::new());
        let disk = Arc::new(DiskCache::new(config.cache_dir.clone()));
        let shared = Arc::new(MemoryCache::new());
        let shared_tier: Arc<dyn CacheTier> = if shared_enabled {
            shared.clone()
        } else {
            Arc::new(DisabledCache)
        };

        let tiers = CacheTiers {
            memory: memory.clone(),
            disk: disk.clone(),
            shared: shared_tier,
        };
        let upstream = Arc::new(TmdbClient::new(config.app_env));
        let proxy = Arc::new(MetadataProxy::new(&config, tiers, upstream));

        let state = Arc::new(AppState::new(proxy.clone(), config));
        let server = TestServer::new(create_router(state)).unwrap();

        Self {
            server,
            proxy,
            memory,
            disk,
            shared,
            _cache_dir: cache_dir,
        }
    }

    fn key(&self, resource: &str) -> CacheKey {
        let credential = Credential::ApiKey("test-key".to_string());
        let url = self
            .proxy
            .canonical_url(resource, &Default::default(), &credential)
            .unwrap();
        CacheKey::new(url)
    }
}

fn keyed_config() -> Config {
    Config {
        tmdb_api_key: Some("test-key".to_string()),
        ..Config::default()
    }
}

async fn mount_movie(tmdb: &MockServer, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path("/movie/550"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("language", "en-US"))
        .and(query_param("region", "IN"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(tmdb)
        .await;
}

#[tokio::test]
async fn test_health_check() {
    let tmdb = MockServer::start().await;
    let harness = Harness::new(&tmdb, keyed_config());

    let response = harness.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_fresh_fetch_populates_every_tier() {
    let tmdb = MockServer::start().await;
    mount_movie(&tmdb, 200, json!({"title": "Fight Club"})).await;
    let harness = Harness::new(&tmdb, keyed_config());

    let response = harness.server.get("/api/tmdb/movie/550").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"title": "Fight Club"}));
    assert!(response.headers().get("warning").is_none());
    assert!(response.headers().get("x-cache").is_none());

    let key = harness.key("movie/550");
    assert_eq!(
        harness.memory.get(&key).await.unwrap().data,
        json!({"title": "Fight Club"})
    );
    assert_eq!(
        harness.disk.get(&key).await.unwrap().data,
        json!({"title": "Fight Club"})
    );
    assert_eq!(
        harness.shared.get(&key).await.unwrap().data,
        json!({"title": "Fight Club"})
    );
}

#[tokio::test]
async fn test_repeat_request_is_served_from_shared_cache() {
    let tmdb = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/550"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Fight Club"})))
        .expect(1)
        .mount(&tmdb)
        .await;
    let harness = Harness::new(&tmdb, keyed_config());

    harness.server.get("/api/tmdb/movie/550").await.assert_status_ok();
    let response = harness.server.get("/api/tmdb/movie/550").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"title": "Fight Club"}));
    assert_eq!(response.headers().get("x-cache").unwrap(), "redis");
}

#[tokio::test]
async fn test_query_order_does_not_change_cache_key() {
    let tmdb = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("with_genres", "28"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"page": 2})))
        .expect(1)
        .mount(&tmdb)
        .await;
    let harness = Harness::new(&tmdb, keyed_config());

    harness
        .server
        .get("/api/tmdb/discover/movie?with_genres=28&page=2")
        .await
        .assert_status_ok();
    let response = harness
        .server
        .get("/api/tmdb/discover/movie?page=2&with_genres=28")
        .await;

    response.assert_status_ok();
    assert_eq!(response.headers().get("x-cache").unwrap(), "redis");
}

#[tokio::test]
async fn test_upstream_outage_serves_previous_snapshot() {
    let tmdb = MockServer::start().await;
    mount_movie(&tmdb, 200, json!({"title": "Fight Club"})).await;
    // Without a shared tier every request reaches the upstream.
    let harness = Harness::with_shared(&tmdb, keyed_config(), false);

    harness.server.get("/api/tmdb/movie/550").await.assert_status_ok();

    tmdb.reset().await;
    mount_movie(&tmdb, 503, json!({"status_message": "Service unavailable"})).await;

    let response = harness.server.get("/api/tmdb/movie/550").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"title": "Fight Club"}));
    assert_eq!(
        response.headers().get("warning").unwrap(),
        "199 - Served stale TMDB disk cache due to upstream 503"
    );
}

#[tokio::test]
async fn test_uncached_resource_with_failing_upstream_is_bad_gateway() {
    let tmdb = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/999999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"status_code": 34})))
        .mount(&tmdb)
        .await;
    let harness = Harness::new(&tmdb, keyed_config());

    let response = harness.server.get("/api/tmdb/movie/999999").await;
    response.assert_status(StatusCode::BAD_GATEWAY);

    let body: Value = response.json();
    assert_eq!(body["error"], "TMDB upstream error");
    assert_eq!(body["status"], 404);
    assert_eq!(body["hint"], "Invalid path or parameters");
    assert!(body["body"].as_str().unwrap().contains("34"));
}

#[tokio::test]
async fn test_missing_credentials_never_reach_upstream() {
    let tmdb = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&tmdb)
        .await;
    let harness = Harness::new(&tmdb, Config::default());

    let response = harness.server.get("/api/tmdb/movie/550").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["error"], "TMDB credentials not configured");
    assert!(body["hint"].is_string());
}

#[tokio::test]
async fn test_bearer_token_credential() {
    let tmdb = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/550"))
        .and(wiremock::matchers::header("authorization", "Bearer v4-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 550})))
        .expect(1)
        .mount(&tmdb)
        .await;
    let config = Config {
        tmdb_access_token: Some("v4-token".to_string()),
        ..Config::default()
    };
    let harness = Harness::new(&tmdb, config);

    let response = harness.server.get("/api/tmdb/movie/550").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"id": 550}));
}

#[tokio::test]
async fn test_production_mode_sets_cache_control() {
    let tmdb = MockServer::start().await;
    mount_movie(&tmdb, 200, json!({"title": "Fight Club"})).await;
    let config = Config {
        app_env: RuntimeMode::Production,
        ..keyed_config()
    };
    let harness = Harness::new(&tmdb, config);

    let response = harness.server.get("/api/tmdb/movie/550").await;
    response.assert_status_ok();
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, s-maxage=86400, stale-while-revalidate=86400"
    );
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let tmdb = MockServer::start().await;
    let harness = Harness::new(&tmdb, keyed_config());

    let response = harness.server.get("/health").await;
    let request_id = response.headers().get("x-request-id").unwrap();
    assert!(!request_id.is_empty());
}

#[tokio::test]
async fn test_search_suggest_ranks_results() {
    let tmdb = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/multi"))
        .and(query_param("query", "fight clb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
            {"id": 1, "media_type": "movie", "title": "Fighting"},
            {"id": 550, "media_type": "movie", "title": "Fight Club"}
        ]})))
        .expect(1)
        .mount(&tmdb)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
            {"id": 550, "title": "Fight Club"}
        ]})))
        .expect(1)
        .mount(&tmdb)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/tv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&tmdb)
        .await;
    let harness = Harness::new(&tmdb, keyed_config());

    let response = harness
        .server
        .get("/api/search/suggest")
        .add_query_param("q", "fight clb")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["title"], "Fight Club");
}

#[tokio::test]
async fn test_search_suggest_blank_query() {
    let tmdb = MockServer::start().await;
    let harness = Harness::new(&tmdb, keyed_config());

    let response = harness.server.get("/api/search/suggest?query=").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"results": []}));
}

#[tokio::test]
async fn test_person_images_pagination() {
    let tmdb = MockServer::start().await;
    let profiles: Vec<Value> = (0..7)
        .map(|i| json!({"file_path": format!("/{}.jpg", i)}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/person/287/images"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 287, "profiles": profiles})),
        )
        .mount(&tmdb)
        .await;
    let harness = Harness::new(&tmdb, keyed_config());

    let response = harness
        .server
        .get("/api/person/287/images?page=2&pageSize=5")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["page"], 2);
    assert_eq!(body["pageSize"], 5);
    assert_eq!(body["total"], 7);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_person_videos() {
    let tmdb = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/person/287/combined_credits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cast": [
            {"id": 550, "title": "Fight Club", "media_type": "movie", "popularity": 61.4}
        ]})))
        .mount(&tmdb)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/550/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
            {"id": "5c9", "key": "qtRKdVHc-cE", "name": "Official Trailer", "site": "YouTube", "type": "Trailer"}
        ]})))
        .mount(&tmdb)
        .await;
    let harness = Harness::new(&tmdb, keyed_config());

    let response = harness.server.get("/api/person/287/videos").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["pageSize"], 9);
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["key"], "qtRKdVHc-cE");
    assert_eq!(body["results"][0]["type"], "Trailer");
    assert_eq!(body["results"][0]["from"]["title"], "Fight Club");
    assert_eq!(body["results"][0]["from"]["media_type"], "movie");
}

#[tokio::test]
async fn test_debug_env_reports_presence_only() {
    let tmdb = MockServer::start().await;
    let harness = Harness::new(&tmdb, keyed_config());

    let response = harness.server.get("/api/debug/env").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["TMDB_API_KEY_present"], true);
    assert_eq!(body["TMDB_ACCESS_TOKEN_present"], false);
    assert_eq!(body["REDIS_URL_present"], false);
    assert_eq!(body["runtime_mode"], "development");
    assert!(!body.to_string().contains("test-key"));
}
