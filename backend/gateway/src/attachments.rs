//! Document upload and page image endpoints.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use docquery_core::DocQueryError;
use docquery_loader::{Document, DocumentKind, UploadedFile, PREVIEW_ROWS};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Handler for `POST /api/sessions/{id}/document`
///
/// Reads the multipart `file` field and binds the parsed document to the
/// session. Any failure leaves the session with no document.
pub async fn upload_document(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    let mut session = handle.lock().await;

    match receive_and_load(&state, &id, &mut multipart).await {
        Ok((kind, document)) => {
            let body = describe(kind.extension(), &document);
            session.replace_document(document);
            Ok(Json(body))
        }
        Err(e) => {
            warn!(session_id = %id, error = %e.message(), "Upload rejected");
            session.clear_document();
            Err(e)
        }
    }
}

async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("the 'file' field has no file name".into()))?;
        let bytes = field.bytes().await?;
        return Ok((name, bytes));
    }
    Err(ApiError::BadRequest("missing multipart field 'file'".into()))
}

async fn receive_and_load(
    state: &GatewayState,
    id: &str,
    multipart: &mut Multipart,
) -> Result<(DocumentKind, Document), ApiError> {
    let (name, bytes) = read_file_field(multipart).await?;
    info!(session_id = %id, file = %name, size = bytes.len(), "Received upload");

    let file = UploadedFile::new(name, bytes)?;
    let loader = state.loader.clone();
    let kind = file.kind;
    let document = tokio::task::spawn_blocking(move || loader.load(&file))
        .await
        .map_err(|e| ApiError::Internal(format!("document loading task failed: {e}")))??;
    Ok((kind, document))
}

fn describe(kind: &str, document: &Document) -> Value {
    match document {
        Document::Tabular(data) => json!({
            "kind": kind,
            "preview": data.preview(PREVIEW_ROWS),
        }),
        Document::Pdf(pdf) => json!({
            "kind": kind,
            "page_count": pdf.page_count(),
            "text_chars": pdf.text.chars().count(),
            "pages": pdf.pages,
        }),
        Document::None => json!({ "kind": "none" }),
    }
}

/// Handler for `GET /api/sessions/{id}/document/pages/{n}`
pub async fn get_page(
    State(state): State<GatewayState>,
    Path((id, n)): Path<(String, usize)>,
) -> Result<Response, ApiError> {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    let session = handle.lock().await;

    let pdf = match &session.document {
        Document::None => return Err(DocQueryError::NoDocument.into()),
        Document::Tabular(_) => {
            return Err(ApiError::NotFound("the loaded document has no pages".into()))
        }
        Document::Pdf(pdf) => pdf,
    };
    let page = pdf.page(n).ok_or_else(|| {
        ApiError::NotFound(format!("page {n} out of range (1..={})", pdf.page_count()))
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], page.png.clone()).into_response())
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::server::tests::{new_session, send, state_with, upload};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    fn pdf_bytes(pages: usize) -> Vec<u8> {
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                let content = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content,
                    "MediaBox" => vec![0.into(), 0.into(), 200.into(), 200.into()],
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[tokio::test]
    async fn pdf_upload_and_pages() {
        let app = build_router(state_with(None));
        let id = new_session(&app).await;

        let (status, body) = upload(&app, &id, "Report.PDF", &pdf_bytes(2)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "pdf");
        assert_eq!(body["page_count"], 2);

        let (status, png) = send(
            &app,
            Request::get(format!("/api/sessions/{id}/document/pages/2"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&png[1..4], b"PNG");

        let (status, _) = send(
            &app,
            Request::get(format!("/api/sessions/{id}/document/pages/3"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unsupported_kind_is_415_and_clears_document() {
        let app = build_router(state_with(None));
        let id = new_session(&app).await;
        let (status, _) = upload(&app, &id, "a.csv", b"x\n1\n").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = upload(&app, &id, "notes.txt", b"hello").await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "unsupported_kind");

        let (status, _) = send(
            &app,
            Request::get(format!("/api/sessions/{id}/document/pages/1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn malformed_csv_is_422() {
        let app = build_router(state_with(None));
        let id = new_session(&app).await;
        let (status, body) = upload(&app, &id, "bad.csv", b"a,b\n1,2,3\n").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "parse_error");
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let app = build_router(state_with(None));
        let (status, body) = upload(&app, "missing", "a.csv", b"x\n1\n").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "session_not_found");
    }
}
