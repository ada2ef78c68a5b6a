use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

use common::prelude::build_info;

use crate::ServiceState;

/// Build information for this binary and the generator it drives.
#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    let msg = serde_json::json!({
        "build": build_info(),
        "generator": state.config().generator.program,
    });
    (StatusCode::OK, Json(msg)).into_response()
}
