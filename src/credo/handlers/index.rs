use axum::response::{Html, IntoResponse};

const INDEX_HTML: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/web/index.html"));

// login form
pub async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}
