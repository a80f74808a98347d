//! HTTP server: shared state, router, and the serve loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use orderiq_core::ExtractionPipeline;
use orderiq_export::{ArtifactStore, PersistenceSink};

use crate::{download, extract_api, health_api};

/// Request-size and CORS settings for the router.
#[derive(Debug, Clone)]
pub struct GatewayLimits {
    /// `*` anywhere in the list allows every origin.
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for GatewayLimits {
    fn default() -> Self {
        Self {
            cors_origins: vec!["*".to_string()],
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<ExtractionPipeline>,
    pub sink: Arc<dyn PersistenceSink>,
    pub artifacts: ArtifactStore,
    pub limits: GatewayLimits,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(
        pipeline: Arc<ExtractionPipeline>,
        sink: Arc<dyn PersistenceSink>,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            pipeline,
            sink,
            artifacts,
            limits: GatewayLimits::default(),
            started_at: Instant::now(),
        }
    }

    pub fn with_limits(mut self, limits: GatewayLimits) -> Self {
        self.limits = limits;
        self
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the Axum router with all API routes.
pub fn build_router(state: GatewayState) -> Router {
    let cors = cors_layer(&state.limits.cors_origins);
    let body_limit = DefaultBodyLimit::max(state.limits.max_upload_bytes);

    Router::new()
        .route("/extract_from_text", post(extract_api::extract_from_text))
        .route("/extract_from_image", post(extract_api::extract_from_image))
        .route("/download_excel/:request_id", get(download::download_excel))
        .route("/api/health", get(health_api::get_health))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("OrderIQ HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("OrderIQ HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use orderiq_core::FieldSchema;
    use orderiq_export::XlsxSink;
    use orderiq_providers::MockBackend;
    use serde_json::Value;
    use tower::ServiceExt;

    pub struct TestApp {
        pub router: Router,
        pub backend: Arc<MockBackend>,
        pub dir: tempfile::TempDir,
    }

    pub fn app_with(backend: MockBackend) -> TestApp {
        app_with_limits(backend, GatewayLimits::default())
    }

    pub fn app_with_limits(backend: MockBackend, limits: GatewayLimits) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(backend);
        let state = GatewayState::new(
            Arc::new(ExtractionPipeline::new(backend.clone())),
            Arc::new(XlsxSink::new(dir.path(), FieldSchema::default())),
            ArtifactStore::new(16),
        )
        .with_limits(limits);
        TestApp {
            router: build_router(state),
            backend,
            dir,
        }
    }

    pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(router, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    pub fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::GatewayLimits;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use orderiq_providers::MockBackend;

    fn preflight(origin: &str) -> Request<Body> {
        Request::options("/extract_from_text")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = app_with(MockBackend::default());
        let (status, _) = send(&app.router, get("/download_excel")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn permissive_cors_answers_preflight() {
        let app = app_with(MockBackend::default());
        let response = tower::ServiceExt::oneshot(app.router.clone(), preflight("http://localhost:3000"))
            .await
            .unwrap();
        assert!(response.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn explicit_origins_restrict_preflight() {
        // The invalid origin is skipped rather than failing startup.
        let limits = GatewayLimits {
            cors_origins: vec!["http://localhost:3000".into(), "bad\norigin".into()],
            ..GatewayLimits::default()
        };
        let app = app_with_limits(MockBackend::default(), limits);

        let allowed = tower::ServiceExt::oneshot(app.router.clone(), preflight("http://localhost:3000"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );

        let denied = tower::ServiceExt::oneshot(app.router.clone(), preflight("http://evil.example"))
            .await
            .unwrap();
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }
}
