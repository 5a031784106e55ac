//! Single-page UI, embedded at compile time.

use axum::response::Html;

static INDEX_HTML: &str = include_str!("../assets/index.html");

/// Handler for `GET /`
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
