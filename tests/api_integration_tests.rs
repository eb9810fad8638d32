//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each admin endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Local};
use feedstash::{
    api::create_router,
    cache::{CachePath, PathCache, Snapshot},
    fingerprint::fingerprint,
    gate::JailState,
    notify::LogNotifier,
    AppState, Config,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

// == Helper Functions ==

fn test_config() -> Config {
    Config {
        rss_feeds: vec!["https://blog.example.com/rss".to_string()],
        ..Config::default()
    }
}

fn create_test_state(cache: PathCache) -> AppState {
    AppState::from_config(&test_config(), cache, Arc::new(LogNotifier))
}

fn create_test_app() -> Router {
    create_router(create_test_state(PathCache::ephemeral()))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// == Links Endpoint Tests ==

#[tokio::test]
async fn test_links_endpoint_returns_stored_links() {
    let mut cache = PathCache::ephemeral();
    let fp = fingerprint("https://blog.example.com/rss");
    cache
        .set(json!(["https://a", "https://b"]), &CachePath::links(&fp), false)
        .unwrap();
    let app = create_router(create_test_state(cache));

    let response = app.oneshot(get(&format!("/links/{}", fp))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["links"], json!(["https://a", "https://b"]));
}

#[tokio::test]
async fn test_links_endpoint_unknown_feed() {
    let response = create_test_app()
        .oneshot(get("/links/0000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("links/0000"));
}

// == Jail Endpoint Tests ==

#[tokio::test]
async fn test_jail_endpoint_defaults_to_unlocked() {
    let response = create_test_app().oneshot(get("/jail")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["locked"], false);
}

#[tokio::test]
async fn test_jail_release_lifts_recent_lock() {
    let mut cache = PathCache::ephemeral();
    let since = Local::now().naive_local() - Duration::minutes(10);
    cache
        .set(JailState::locked(since).to_value(), &CachePath::jail_state(), false)
        .unwrap();
    let app = create_router(create_test_state(cache));

    let locked = app.clone().oneshot(get("/jail")).await.unwrap();
    assert_eq!(body_to_json(locked.into_body()).await["locked"], true);

    let response = app.clone().oneshot(post("/jail/release", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["locked"], false);

    let after = app.oneshot(get("/jail")).await.unwrap();
    assert_eq!(body_to_json(after.into_body()).await["locked"], false);
}

// == Maintenance Endpoint Tests ==

#[tokio::test]
async fn test_reset_endpoint_empties_links() {
    let mut cache = PathCache::ephemeral();
    cache
        .set(json!(["https://a"]), &CachePath::links("abc"), false)
        .unwrap();
    let app = create_router(create_test_state(cache));

    let response = app.clone().oneshot(post("/reset/links", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/links/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reset_endpoint_rejects_unknown_key() {
    let response = create_test_app()
        .oneshot(post("/reset/everything", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clean_endpoint_keeps_configured_feeds() {
    let mut cache = PathCache::ephemeral();
    let kept = fingerprint("https://blog.example.com/rss");
    cache
        .set(json!(["https://a"]), &CachePath::links(&kept), false)
        .unwrap();
    cache
        .set(json!(["https://b"]), &CachePath::links("stale"), false)
        .unwrap();
    let app = create_router(create_test_state(cache));

    let response = app.clone().oneshot(post("/clean", "{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 1);

    let response = app.oneshot(get(&format!("/links/{}", kept))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_clean_endpoint_rejects_blank_feed() {
    let response = create_test_app()
        .oneshot(post("/clean", r#"{"feeds":[""]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dedupe_endpoint() {
    let mut cache = PathCache::ephemeral();
    cache
        .set(json!(["https://a", "https://a"]), &CachePath::links("abc"), false)
        .unwrap();
    let app = create_router(create_test_state(cache));

    let response = app.oneshot(post("/dedupe", "")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 1);
    assert_eq!(json["links"], 1);
}

// == Save Endpoint Tests ==

#[tokio::test]
async fn test_save_endpoint_writes_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("feedstash.json");
    let mut cache = PathCache::load_from(Snapshot::new(&path, false));
    cache
        .set(json!(["https://a"]), &CachePath::links("abc"), false)
        .unwrap();
    let app = create_router(create_test_state(cache));

    let response = app.oneshot(post("/save", "")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["links"]["abc"], json!(["https://a"]));
    assert!(written.get("jail_state").is_some());
}

#[tokio::test]
async fn test_save_endpoint_reports_failure() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let cache = PathCache::load_from(Snapshot::new(blocker.join("feedstash.json"), false));
    let app = create_router(create_test_state(cache));

    let response = app.oneshot(post("/save", "")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// == Stats & Health Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_counts_lookups() {
    let app = create_test_app();

    app.clone().oneshot(get("/links/missing")).await.unwrap();
    let response = app.oneshot(get("/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["misses"], 1);
    assert_eq!(json["hits"], 0);
    assert_eq!(json["links"], 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = create_test_app().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["dry_run"], true);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let response = create_test_app().oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
