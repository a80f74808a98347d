//! Gateway Health API

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub backend: String,
    pub uptime_seconds: u64,
    pub artifacts: usize,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok".into(),
        service: "orderiq".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        backend: state.pipeline.backend_name().to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        artifacts: state.artifacts.len().await,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use crate::server::test_support::*;
    use axum::http::StatusCode;
    use orderiq_providers::MockBackend;

    #[tokio::test]
    async fn reports_backend_and_version() {
        let app = app_with(MockBackend::new("scripted"));
        let (status, body) = send_json(&app.router, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "orderiq");
        assert_eq!(body["backend"], "scripted");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["artifacts"], 0);
        assert!(body["uptime_seconds"].is_u64());
    }
}
