//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Local;
use tokio::sync::{Mutex, RwLock};

use crate::cache::{CachePath, PathCache, JAIL_STATE_KEY};
use crate::config::Config;
use crate::crawler::maintenance;
use crate::error::{CacheError, Result};
use crate::gate::{AccessGate, JailState};
use crate::models::{
    CleanRequest, CleanResponse, DedupeResponse, HealthResponse, JailResponse, LinksResponse,
    MessageResponse, StatsResponse,
};
use crate::notify::Notifier;

/// Application state shared across all handlers.
///
/// Gate calls lock the gate first, then the cache.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe path cache
    pub cache: Arc<RwLock<PathCache>>,
    /// Login throttle sharing the cache's jail entry
    pub gate: Arc<Mutex<AccessGate>>,
    /// Feeds whose links survive a clean without an explicit list
    pub feeds: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(cache: PathCache, gate: AccessGate, feeds: Vec<String>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            gate: Arc::new(Mutex::new(gate)),
            feeds: Arc::new(feeds),
        }
    }

    /// Wraps a loaded cache together with a gate configured from `config`.
    pub fn from_config(config: &Config, cache: PathCache, notifier: Arc<dyn Notifier>) -> Self {
        let gate = AccessGate::new(notifier, config);
        Self::new(cache, gate, config.configured_feeds())
    }
}

/// Handler for GET /links/:fingerprint
pub async fn links_handler(
    State(state): State<AppState>,
    Path(fingerprint): Path<String>,
) -> Result<Json<LinksResponse>> {
    // Write lock, lookups update the stats
    let mut cache = state.cache.write().await;
    let stored = cache.get(&CachePath::links(&fingerprint))?;

    Ok(Json(LinksResponse::new(fingerprint, stored)))
}

/// Handler for GET /jail
pub async fn jail_handler(State(state): State<AppState>) -> Json<JailResponse> {
    let cache = state.cache.read().await;
    let jail = JailState::from_value(cache.root().get(JAIL_STATE_KEY), Local::now().naive_local());

    Json(jail.into())
}

/// Handler for POST /jail/release
///
/// Lifts the login jail regardless of the cooldown.
pub async fn release_handler(State(state): State<AppState>) -> Json<JailResponse> {
    let mut gate = state.gate.lock().await;
    let mut cache = state.cache.write().await;

    let now = Local::now().naive_local();
    gate.check_access_at(&mut cache, "", true, now);

    Json(gate.state_at(&mut cache, now).into())
}

/// Handler for POST /dedupe
pub async fn dedupe_handler(State(state): State<AppState>) -> Result<Json<DedupeResponse>> {
    let mut cache = state.cache.write().await;
    let removed = cache.dedupe();
    cache.save()?;

    Ok(Json(DedupeResponse {
        removed,
        links: cache.link_count(),
    }))
}

/// Handler for POST /clean
///
/// Evicts the link lists of every feed not named in the request, or not
/// configured when the request names none.
pub async fn clean_handler(
    State(state): State<AppState>,
    Json(req): Json<CleanRequest>,
) -> Result<Json<CleanResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let feeds = if req.feeds.is_empty() {
        state.feeds.to_vec()
    } else {
        req.feeds
    };

    let mut cache = state.cache.write().await;
    let removed = maintenance::clean_links(&mut cache, &feeds)?;

    Ok(Json(CleanResponse { removed, feeds }))
}

/// Handler for POST /reset/:key
pub async fn reset_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>> {
    let mut cache = state.cache.write().await;
    cache.reset(&key)?;

    Ok(Json(MessageResponse::reset(&key)))
}

/// Handler for POST /save
pub async fn save_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    let mut cache = state.cache.write().await;
    cache.save()?;

    let snapshot = cache.snapshot();
    Ok(Json(MessageResponse::saved(
        snapshot.path(),
        snapshot.is_dry_run(),
    )))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;

    Json(StatsResponse::new(cache.stats(), cache.link_count()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.cache.read().await;

    Json(HealthResponse::healthy(cache.snapshot().is_dry_run()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::notify::testing::RecordingNotifier;
    use serde_json::json;

    fn test_state(notifier: &RecordingNotifier) -> AppState {
        let config = Config::default();
        AppState::from_config(&config, PathCache::ephemeral(), Arc::new(notifier.clone()))
    }

    #[tokio::test]
    async fn test_links_handler() {
        let state = test_state(&RecordingNotifier::default());
        let fp = fingerprint("https://a/rss");
        state
            .cache
            .write()
            .await
            .set(json!(["https://a/1"]), &CachePath::links(&fp), false)
            .unwrap();

        let response = links_handler(State(state), Path(fp)).await.unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.links[0], "https://a/1");
    }

    #[tokio::test]
    async fn test_links_handler_unknown_feed() {
        let state = test_state(&RecordingNotifier::default());
        let result = links_handler(State(state), Path("nope".to_string())).await;
        assert!(matches!(result, Err(CacheError::KeyNotFound(_))));
    }

    #[tokio::test]
    async fn test_release_handler_unlocks() {
        let notifier = RecordingNotifier::default();
        let state = test_state(&notifier);
        state
            .cache
            .write()
            .await
            .set(
                JailState::locked(Local::now().naive_local()).to_value(),
                &CachePath::jail_state(),
                false,
            )
            .unwrap();
        assert!(jail_handler(State(state.clone())).await.locked);

        let response = release_handler(State(state.clone())).await;

        assert!(!response.locked);
        assert!(!jail_handler(State(state)).await.locked);
        assert_eq!(notifier.messages(), vec!["Out of login jail."]);
    }

    #[tokio::test]
    async fn test_reset_handler_rejects_unknown_key() {
        let state = test_state(&RecordingNotifier::default());
        let result = reset_handler(State(state), Path("bogus".to_string())).await;
        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_clean_handler_uses_request_feeds() {
        let state = test_state(&RecordingNotifier::default());
        {
            let mut cache = state.cache.write().await;
            cache
                .set(json!(["x"]), &CachePath::links(fingerprint("keep")), false)
                .unwrap();
            cache
                .set(json!(["y"]), &CachePath::links(fingerprint("drop")), false)
                .unwrap();
        }

        let req = CleanRequest {
            feeds: vec!["keep".to_string()],
        };
        let response = clean_handler(State(state.clone()), Json(req)).await.unwrap();

        assert_eq!(response.removed, 1);
        assert_eq!(state.cache.read().await.link_count(), 1);
    }

    #[tokio::test]
    async fn test_dedupe_handler() {
        let state = test_state(&RecordingNotifier::default());
        state
            .cache
            .write()
            .await
            .set(json!(["x", "x"]), &CachePath::links("f"), false)
            .unwrap();

        let response = dedupe_handler(State(state)).await.unwrap();
        assert_eq!(response.removed, 1);
        assert_eq!(response.links, 1);
    }

    #[tokio::test]
    async fn test_stats_and_health() {
        let state = test_state(&RecordingNotifier::default());

        let stats = stats_handler(State(state.clone())).await;
        assert_eq!(stats.stats.hits, 0);
        assert_eq!(stats.links, 0);

        let health = health_handler(State(state)).await;
        assert_eq!(health.status, "healthy");
        assert!(health.dry_run);
    }
}
