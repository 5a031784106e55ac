//! Health and setup endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::GatewayState;

/// Whether the language model can be reached, as shown by the UI.
#[derive(Debug, Clone, Serialize)]
pub struct SetupStatus {
    pub credential_present: bool,
    pub provider: String,
    pub model: String,
    pub default_temperature: f32,
    /// User-facing explanation when queries cannot run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub sessions: usize,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        uptime_seconds: state.started_at.elapsed().as_secs(),
        sessions: state.sessions.len().await,
        timestamp: Utc::now(),
    })
}

/// Handler for `GET /api/setup`
pub async fn get_setup(State(state): State<GatewayState>) -> Json<SetupStatus> {
    Json(state.setup.clone())
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::server::tests::{send_json, state_with};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn setup_reports_missing_credential() {
        let app = build_router(state_with(None));
        let (status, body) =
            send_json(&app, Request::get("/api/setup").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["credential_present"], false);
        assert_eq!(body["message"], "OPENAI_API_KEY is not set");
        assert!((body["default_temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }
}
