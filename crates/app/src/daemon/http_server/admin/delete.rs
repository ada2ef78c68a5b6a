use axum::extract::{Path, State};
use axum::response::Response;
use axum::Extension;

use common::prelude::*;

use super::{finish_change, list_url, RootPath};
use crate::daemon::http_server::error::AdminError;
use crate::ServiceState;

/// Directory the operator returns to after removing `path`.
fn parent_of(path: &str) -> &str {
    path.trim_matches('/')
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .unwrap_or("")
}

#[tracing::instrument(skip(state, session))]
pub async fn file(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Path(path): Path<RootPath>,
) -> Result<Response, AdminError> {
    let root = path.root()?;
    let change = state.content().delete_file(root, &path.path).await?;
    finish_change(&state, &session, change, &list_url(root, parent_of(&path.path))).await
}

#[tracing::instrument(skip(state, session))]
pub async fn directory(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Path(path): Path<RootPath>,
) -> Result<Response, AdminError> {
    let root = path.root()?;
    let change = state.content().delete_directory(root, &path.path).await?;
    finish_change(&state, &session, change, &list_url(root, parent_of(&path.path))).await
}
