//! API error bodies and status mapping.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docquery_core::DocQueryError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// A session-level failure from loading or querying.
    Doc(DocQueryError),
    SessionNotFound(String),
    NotFound(String),
    BadRequest(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Doc(err) => match err {
                DocQueryError::UnsupportedKind(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                DocQueryError::ParseError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DocQueryError::NoDocument => StatusCode::CONFLICT,
                DocQueryError::AgentExecutionError(_) => StatusCode::BAD_GATEWAY,
                DocQueryError::Setup(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::SessionNotFound(_) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Doc(err) => err.code(),
            ApiError::SessionNotFound(_) => "session_not_found",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Doc(err) => err.to_string(),
            ApiError::SessionNotFound(id) => format!("unknown session '{id}'"),
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::Internal(msg) => msg.clone(),
        }
    }
}

impl From<DocQueryError> for ApiError {
    fn from(err: DocQueryError) -> Self {
        ApiError::Doc(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.message(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}
