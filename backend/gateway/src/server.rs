//! Main HTTP Gateway Server.

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use docquery_agent::QueryExecutor;
use docquery_core::DocQueryError;
use docquery_loader::DocumentLoader;

use crate::health_api::SetupStatus;
use crate::session_registry::SessionRegistry;
use crate::{attachments, control_ui, health_api, query_api};

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub sessions: SessionRegistry,
    pub loader: DocumentLoader,
    /// `None` when the provider cannot be used, e.g. a missing credential.
    pub executor: Option<Arc<QueryExecutor>>,
    pub setup: SetupStatus,
    pub max_upload_bytes: usize,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(
        loader: DocumentLoader,
        executor: Option<QueryExecutor>,
        setup: SetupStatus,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            loader,
            executor: executor.map(Arc::new),
            setup,
            max_upload_bytes,
            started_at: Instant::now(),
        }
    }

    /// The executor, or the setup error explaining why there is none.
    pub fn executor(&self) -> Result<Arc<QueryExecutor>, DocQueryError> {
        self.executor.clone().ok_or_else(|| {
            DocQueryError::Setup(
                self.setup
                    .message
                    .clone()
                    .unwrap_or_else(|| "no language model provider configured".to_string()),
            )
        })
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: GatewayState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(control_ui::index))
        .route("/api/health", get(health_api::get_health))
        .route("/api/setup", get(health_api::get_setup))
        .route("/api/sessions", post(query_api::create_session))
        .route("/api/sessions/{id}", delete(query_api::delete_session))
        .route("/api/sessions/{id}/document", post(attachments::upload_document))
        .route("/api/sessions/{id}/document/pages/{n}", get(attachments::get_page))
        .route("/api/sessions/{id}/query", post(query_api::post_query))
        .route("/api/sessions/{id}/history", get(query_api::get_history))
        .route("/api/sessions/{id}/export", get(query_api::export_history))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the Axum HTTP server.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway HTTP server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use docquery_agent::ModelConfig;
    use docquery_loader::{PageImage, PageRasterizer};
    use docquery_planner::MockProvider;
    use serde_json::{json, Value};
    use std::path::Path;
    use tower::ServiceExt;

    pub(crate) const BOUNDARY: &str = "docquery-test-boundary";

    /// One blank 2x3 page per pdf page.
    pub(crate) struct FakeRasterizer;

    impl PageRasterizer for FakeRasterizer {
        fn rasterize(&self, path: &Path) -> anyhow::Result<Vec<PageImage>> {
            let doc = lopdf::Document::load(path)?;
            Ok((1..=doc.get_pages().len())
                .map(|page_number| PageImage {
                    page_number,
                    width: 2,
                    height: 3,
                    png: vec![0x89, b'P', b'N', b'G'].into(),
                })
                .collect())
        }
    }

    pub(crate) fn state_with(provider: Option<Arc<MockProvider>>) -> GatewayState {
        let loader = DocumentLoader::new(Arc::new(FakeRasterizer));
        let executor = provider.map(|p| QueryExecutor::new(p, ModelConfig::default()));
        let setup = SetupStatus {
            credential_present: executor.is_some(),
            provider: "mock".into(),
            model: "mock".into(),
            default_temperature: 0.3,
            message: executor
                .is_none()
                .then(|| "OPENAI_API_KEY is not set".to_string()),
        };
        GatewayState::new(loader, executor, setup, 1024 * 1024)
    }

    pub(crate) fn multipart(file_name: &str, bytes: &[u8]) -> Body {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    pub(crate) async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub(crate) async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, request).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub(crate) async fn new_session(app: &Router) -> String {
        let (status, body) = send_json(
            app,
            Request::post("/api/sessions").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    pub(crate) async fn upload(app: &Router, id: &str, file_name: &str, bytes: &[u8]) -> (StatusCode, Value) {
        send_json(
            app,
            Request::post(format!("/api/sessions/{id}/document"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(multipart(file_name, bytes))
                .unwrap(),
        )
        .await
    }

    pub(crate) async fn document_kind(app: &Router, id: &str) -> String {
        let (status, body) = send_json(
            app,
            Request::get(format!("/api/sessions/{id}/history")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["document"].as_str().unwrap().to_string()
    }

    pub(crate) async fn query(app: &Router, id: &str, body: Value) -> (StatusCode, Value) {
        send_json(
            app,
            Request::post(format!("/api/sessions/{id}/query"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    #[tokio::test]
    async fn csv_session_end_to_end() {
        let provider = Arc::new(MockProvider::new("mock").with_recording().with_response("Final Answer: 3"));
        let app = build_router(state_with(Some(provider.clone())));
        let id = new_session(&app).await;

        let (status, preview) = upload(&app, &id, "people.csv", b"name,age\nAnn,34\nBo,27\nCy,41\n").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(preview["kind"], "csv");
        assert_eq!(preview["preview"]["total_rows"], 3);

        let (status, body) = query(&app, &id, json!({"query": "how many rows?"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "3");
        assert_eq!(body["transcript"][0]["text"], "AI: 3");
        assert_eq!(body["transcript"][1]["text"], "USER: how many rows?");
        assert!(provider.requests()[0].user_prompt.contains("CSV/XLSX data"));
        assert!((provider.requests()[0].temperature - 0.3).abs() < f32::EPSILON);

        let (status, history) = send_json(
            &app,
            Request::get(format!("/api/sessions/{id}/history")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["transcript"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn health_and_index() {
        let app = build_router(state_with(None));
        let (status, body) = send_json(&app, Request::get("/api/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, html) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(html).unwrap().contains("<title>DocQuery</title>"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = build_router(state_with(None));
        let id = new_session(&app).await;
        let (status, _) = upload(&app, &id, "a.csv", b"x\n1\n").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(document_kind(&app, &id).await, "tabular");

        let big = vec![b'a'; 2 * 1024 * 1024];
        let (status, body) = upload(&app, &id, "big.csv", &big).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "payload_too_large");
        assert_eq!(document_kind(&app, &id).await, "none");
    }

    #[tokio::test]
    async fn upload_without_file_field_clears_document() {
        let app = build_router(state_with(None));
        let id = new_session(&app).await;
        let (status, _) = upload(&app, &id, "a.csv", b"x\n1\n").await;
        assert_eq!(status, StatusCode::OK);

        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{BOUNDARY}--\r\n"
        );
        let (status, body) = send_json(
            &app,
            Request::post(format!("/api/sessions/{id}/document"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "missing multipart field 'file'");
        assert_eq!(document_kind(&app, &id).await, "none");
    }
}
