use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;

use common::prelude::*;

use super::{finish_change, list_url, parse_location};
use crate::daemon::http_server::error::AdminError;
use crate::ServiceState;

/// The rename/move form; both directories are `root[/sub/dir]`.
#[derive(Debug, Deserialize)]
pub struct MoveForm {
    pub from_dir: String,
    pub orig_name: String,
    #[serde(default)]
    pub is_dir: String,
    #[serde(default)]
    pub new_name: String,
    pub dest_dir: String,
}

#[tracing::instrument(skip(state, session))]
pub async fn handler(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Form(form): Form<MoveForm>,
) -> Result<Response, AdminError> {
    let (from_root, from_dir) = parse_location(&form.from_dir)?;
    let (to_root, to_dir) = parse_location(&form.dest_dir)?;
    let request = MoveRequest {
        from_root,
        from_dir,
        orig_name: form.orig_name,
        to_root,
        to_dir,
        new_name: form.new_name.trim().to_string(),
        is_dir: form.is_dir == "1",
    };
    let back = list_url(request.from_root, &request.from_dir);

    match state.content().move_or_rename(&request).await? {
        MoveOutcome::Moved(change) => finish_change(&state, &session, change, &back).await,
        MoveOutcome::Unchanged => {
            state
                .sessions()
                .flash()
                .set(&session, "Nothing to do: name and directory are unchanged.", Severity::Info)
                .await?;
            Ok(Redirect::to(&back).into_response())
        }
    }
}
