//! SaverFox AI HTTP service.
//!
//! This crate provides the axum boundary over the money adventure
//! generator and evaluator: configuration loading, routing, CORS and
//! request tracing.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use axum::http::HeaderValue;
use crate::config::ServerConfig;
use crate::state::AppState;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the complete application with CORS and request tracing.
pub fn app(state: Arc<AppState>, config: &ServerConfig) -> Router {
    routes::router(state, &config.api_prefix)
        .layer(cors_layer(&config.cors_origin_list()))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[&str]) -> CorsLayer {
    let allow_origin = if origins.contains(&"*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| tracing::warn!(origin, error = %e, "Ignoring invalid CORS origin"))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use saverfox_adventure::{AdventureService, GeneratorConfig};
    use saverfox_ai::{NoopTraceSink, StubBackend};
    use tower::ServiceExt;

    fn test_app(cors_origins: &str) -> Router {
        let config: ServerConfig = serde_json::from_value(serde_json::json!({
            "cors_origins": cors_origins,
        }))
        .expect("config");
        let service = AdventureService::new(
            Arc::new(StubBackend::new()),
            Arc::new(NoopTraceSink),
            GeneratorConfig::default(),
        );
        app(Arc::new(AppState::new(service)), &config)
    }

    async fn health_with_origin(app: Router, origin: &str) -> (StatusCode, Option<HeaderValue>) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .cloned();
        (response.status(), allowed)
    }

    #[tokio::test]
    async fn configured_origin_is_allowed() {
        let app = test_app("http://localhost:3000, http://localhost:8000");
        let (status, allowed) = health_with_origin(app, "http://localhost:3000").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            allowed,
            Some(HeaderValue::from_static("http://localhost:3000"))
        );
    }

    #[tokio::test]
    async fn unknown_origin_gets_no_cors_header() {
        let app = test_app("http://localhost:3000");
        let (_, allowed) = health_with_origin(app, "http://evil.example").await;
        assert_eq!(allowed, None);
    }

    #[tokio::test]
    async fn wildcard_allows_any_origin() {
        let app = test_app("*");
        let (_, allowed) = health_with_origin(app, "http://anywhere.example").await;
        assert_eq!(allowed, Some(HeaderValue::from_static("*")));
    }
}
