use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use super::not_found_handler;
use crate::daemon::http_server::ADMIN_PREFIX;
use crate::ServiceState;

const BODY_CLOSE: &[u8] = b"</body>";

/// Serve the generated site, with a link back into the admin on every page.
#[tracing::instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn site_handler(State(state): State<ServiceState>, request: Request) -> Response {
    let headers = request.headers().clone();
    let path = request.uri().path().to_string();

    let service =
        ServeDir::new(state.layout().output_dir()).append_index_html_on_directories(true);
    let response = match service.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    if response.status() == StatusCode::NOT_FOUND {
        return not_found_handler(&headers, &path).await;
    }

    let (mut parts, body) = response.into_parts();
    let is_html = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    if parts.status != StatusCode::OK || !is_html {
        return Response::from_parts(parts, Body::new(body));
    }

    let bytes = match axum::body::to_bytes(Body::new(body), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("failed to read generated page: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(inject_marker(&bytes)))
}

fn admin_marker() -> String {
    format!(
        "<div id=\"site-admin-notice\" style=\"background:red;color:yellow;padding:.5em;\
         position:fixed;bottom:0;right:0;width:200px;text-align:center\">\
         <strong><small><a href=\"{}/\" style=\"color:yellow\">Admin</a></small></strong></div>",
        ADMIN_PREFIX
    )
}

/// Insert the admin marker before the last `</body>`. Pages without one are
/// returned unchanged.
fn inject_marker(page: &[u8]) -> Vec<u8> {
    let Some(at) = page
        .windows(BODY_CLOSE.len())
        .rposition(|w| w.eq_ignore_ascii_case(BODY_CLOSE))
    else {
        return page.to_vec();
    };
    let marker = admin_marker();
    let mut out = Vec::with_capacity(page.len() + marker.len());
    out.extend_from_slice(&page[..at]);
    out.extend_from_slice(marker.as_bytes());
    out.extend_from_slice(&page[at..]);
    out
}
