use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

use crate::ServiceState;

/// Ready once the work directory exists and the build worker is alive.
#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    if !state.builds().is_running() {
        let msg = serde_json::json!({
            "status": "failure",
            "message": "build worker is not running"
        });
        return (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response();
    }
    if !tokio::fs::try_exists(state.layout().work_dir())
        .await
        .unwrap_or(false)
    {
        let msg = serde_json::json!({
            "status": "failure",
            "message": "work directory is missing"
        });
        return (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response();
    }

    let msg = serde_json::json!({"status": "ok"});
    (StatusCode::OK, Json(msg)).into_response()
}
