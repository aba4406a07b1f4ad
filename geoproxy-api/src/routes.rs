//! API route configuration.

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Geocoding lookup
        .route("/api", get(handlers::lookup))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use geoproxy_cache::MemoryCache;
    use geoproxy_core::error::{GeoproxyError, Result};
    use geoproxy_core::traits::{CacheStore, Geocoder};
    use geoproxy_core::types::{GeocodeResult, Place};

    use crate::dto::LookupResponse;
    use crate::state::{ApiConfig, CacheBackend};

    struct StubGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn fetch(&self, query: &str) -> Result<GeocodeResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query == "Atlantis" {
                return Ok(vec![]);
            }
            Ok(vec![Place {
                place_id: 1,
                display_name: query.into(),
                importance: 0.5,
                ..Default::default()
            }])
        }
    }

    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(GeoproxyError::CacheUnavailable("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<()> {
            Err(GeoproxyError::CacheUnavailable("connection refused".into()))
        }
    }

    fn test_app_with(cache: Arc<dyn CacheStore>) -> (Router, Arc<StubGeocoder>) {
        let upstream = Arc::new(StubGeocoder { calls: AtomicUsize::new(0) });
        let state = AppState::from_parts(
            ApiConfig::default(),
            cache,
            upstream.clone(),
            CacheBackend::Memory,
        );
        (create_router(Arc::new(state)), upstream)
    }

    fn test_app() -> (Router, Arc<StubGeocoder>) {
        test_app_with(Arc::new(MemoryCache::new()))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = test_app();
        let (status, body) = get(&app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache_backend"], "memory");
        assert_eq!(body["cache_ttl_seconds"], 5);
    }

    #[tokio::test]
    async fn test_lookup_miss_then_hit() {
        let (app, upstream) = test_app();

        let (status, body) = get(&app, "/api?q=Berlin").await;
        assert_eq!(status, StatusCode::OK);
        let first: LookupResponse = serde_json::from_value(body).unwrap();
        assert!(!first.cache);
        assert_eq!(first.data[0].display_name, "Berlin");

        let (_, body) = get(&app, "/api?q=Berlin").await;
        let second: LookupResponse = serde_json::from_value(body).unwrap();
        assert!(second.cache);
        assert_eq!(second.data, first.data);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_decodes_query() {
        let (app, _) = test_app();
        let (status, body) = get(&app, "/api?q=New%20York%2C%20NY").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["display_name"], "New York, NY");
    }

    #[tokio::test]
    async fn test_lookup_empty_query() {
        let (app, upstream) = test_app();

        let (status, body) = get(&app, "/api?q=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cache"], false);

        let (_, body) = get(&app, "/api?q=").await;
        assert_eq!(body["cache"], true);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_no_matches() {
        let (app, _) = test_app();
        let (status, body) = get(&app, "/api?q=Atlantis").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "cache": false, "data": [] }));
    }

    #[tokio::test]
    async fn test_lookup_missing_query() {
        let (app, upstream) = test_app();
        let (status, body) = get(&app, "/api").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lookup_cache_down() {
        let (app, upstream) = test_app_with(Arc::new(DownStore));
        let (status, body) = get(&app, "/api?q=Berlin").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.get("data").is_none());
        assert_eq!(body["error"]["code"], "CACHE_UNAVAILABLE");
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }
}
