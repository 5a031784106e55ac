//! Session lifecycle, query and transcript endpoints.

use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use docquery_agent::{export, HistoryRenderer};
use docquery_logging::{TurnEvent, TurnLogger};

use crate::error::ApiError;
use crate::server::GatewayState;
use crate::session_registry::SessionHandle;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub temperature: Option<f32>,
}

async fn session(state: &GatewayState, id: &str) -> Result<SessionHandle, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
}

/// Handler for `POST /api/sessions`
pub async fn create_session(State(state): State<GatewayState>) -> (StatusCode, Json<Value>) {
    let id = state.sessions.create().await;
    (StatusCode::CREATED, Json(json!({ "session_id": id })))
}

/// Handler for `DELETE /api/sessions/{id}`
pub async fn delete_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

/// Handler for `POST /api/sessions/{id}/query`
///
/// Runs one full turn under the session lock and returns the answer with the
/// updated transcript.
pub async fn post_query(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Value>, ApiError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".into()));
    }
    let temperature = req.temperature.unwrap_or(state.setup.default_temperature);
    if !(0.0..=1.0).contains(&temperature) {
        return Err(ApiError::BadRequest(format!(
            "temperature must be within [0.0, 1.0], got {temperature}"
        )));
    }

    let handle = session(&state, &id).await?;
    let executor = state.executor()?;
    let mut session = handle.lock().await;

    TurnLogger::log_event(
        &id,
        TurnEvent::QueryReceived {
            query: query.to_string(),
            document: session.document.kind_label().to_string(),
            temperature,
        },
    );
    let started = Instant::now();

    match executor.run_turn(&mut session, query, temperature).await {
        Ok(answer) => {
            TurnLogger::log_event(
                &id,
                TurnEvent::Answered {
                    answer: answer.clone(),
                    latency_ms: started.elapsed().as_millis() as u64,
                },
            );
            Ok(Json(json!({
                "answer": answer,
                "transcript": HistoryRenderer::render(session.history.history()),
            })))
        }
        Err(e) => {
            TurnLogger::log_event(
                &id,
                TurnEvent::Failed {
                    code: e.code().to_string(),
                    error_msg: e.to_string(),
                },
            );
            Err(e.into())
        }
    }
}

/// Handler for `GET /api/sessions/{id}/history`
pub async fn get_history(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let handle = session(&state, &id).await?;
    let session = handle.lock().await;
    Ok(Json(json!({
        "session_id": session.id,
        "document": session.document.kind_label(),
        "transcript": HistoryRenderer::render(session.history.history()),
    })))
}

/// Handler for `GET /api/sessions/{id}/export`
pub async fn export_history(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let handle = session(&state, &id).await?;
    let session = handle.lock().await;
    let html = export::render_html("DocQuery transcript", &session);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export::export_filename(&session.id)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        html,
    )
        .into_response())
}
