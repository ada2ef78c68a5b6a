use askama::Template;
use askama_axum::IntoResponse;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;

#[derive(Template)]
#[template(path = "pages/not_found.html")]
struct NotFoundTemplate<'a> {
    path: &'a str,
}

/// 404 in whatever shape the client asked for.
pub async fn not_found_handler(headers: &HeaderMap, path: &str) -> Response {
    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());

    match accept {
        Some(accept_str) if accept_str.contains("application/json") => {
            let err_msg = serde_json::json!({"msg": "not found", "path": path});
            (StatusCode::NOT_FOUND, Json(err_msg)).into_response()
        }
        Some(accept_str) if accept_str.contains("text/html") => {
            (StatusCode::NOT_FOUND, NotFoundTemplate { path }).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("not found: {}", path),
        )
            .into_response(),
    }
}
