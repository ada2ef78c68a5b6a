use axum::extract::{Path, State};
use axum::response::Response;
use axum::{Extension, Form};
use serde::Deserialize;

use common::path_guard::join_relative;
use common::prelude::*;

use super::{edit_url, finish_change, list_url, RootPath};
use crate::daemon::http_server::error::AdminError;
use crate::ServiceState;

#[derive(Debug, Deserialize)]
pub struct NewFileForm {
    #[serde(default)]
    pub new_filename: String,
}

#[derive(Debug, Deserialize)]
pub struct NewDirForm {
    #[serde(default)]
    pub new_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct NewPageForm {
    #[serde(default)]
    pub title: String,
}

#[tracing::instrument(skip(state, session))]
pub async fn file(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Path(path): Path<RootPath>,
    Form(form): Form<NewFileForm>,
) -> Result<Response, AdminError> {
    let root = path.root()?;
    let change = state
        .content()
        .create_file(root, &path.path, form.new_filename.trim())
        .await?;
    finish_change(&state, &session, change, &list_url(root, &path.path)).await
}

#[tracing::instrument(skip(state, session))]
pub async fn directory(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Path(path): Path<RootPath>,
    Form(form): Form<NewDirForm>,
) -> Result<Response, AdminError> {
    let root = path.root()?;
    let change = state
        .content()
        .create_directory(root, &path.path, form.new_dir.trim())
        .await?;
    finish_change(&state, &session, change, &list_url(root, &path.path)).await
}

/// Create a page from a title and open it in the editor.
#[tracing::instrument(skip(state, session))]
pub async fn page(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Path(path): Path<RootPath>,
    Form(form): Form<NewPageForm>,
) -> Result<Response, AdminError> {
    let root = path.root()?;
    let change = state
        .content()
        .create_page(root, &path.path, &form.title)
        .await?;
    let target = edit_url(root, &join_relative(&path.path, &change.name));
    finish_change(&state, &session, change, &target).await
}
