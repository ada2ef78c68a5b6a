use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form};
use serde::Deserialize;

use common::layout::SITE_CONFIG_FILE_NAME;
use common::prelude::*;

use super::{admin_url, edit_url, finish_change, list_url, RootPath};
use crate::daemon::http_server::error::AdminError;
use crate::ServiceState;

#[derive(Template)]
#[template(path = "pages/edit.html")]
pub struct EditTemplate {
    pub flash: Option<FlashMessage>,
    pub file_name: String,
    pub location: String,
    pub contents: String,
    pub language: &'static str,
    pub action: String,
    pub back_href: String,
    pub preview_css: Option<String>,
    pub is_config: bool,
}

#[derive(Debug, Deserialize)]
pub struct SaveForm {
    #[serde(default)]
    pub contents: String,
    /// Present when the operator wants to keep editing after saving
    pub save_and_edit: Option<String>,
}

/// Editor syntax hint for a file name.
fn language_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "md" | "mdwn" | "mdown" | "markdown" | "mmd" | "gfm" => "markdown",
        "html" | "htm" => "html",
        "yaml" | "yml" => "yaml",
        "json" => "json",
        "js" => "javascript",
        "css" => "css",
        "scss" | "sass" => "scss",
        "toml" => "toml",
        "ini" => "ini",
        "svg" | "xml" => "xml",
        "csv" => "csv",
        _ => "text",
    }
}

fn split_rel(path: &str) -> (&str, &str) {
    let path = path.trim_matches('/');
    path.rsplit_once('/').unwrap_or(("", path))
}

#[tracing::instrument(skip(state, session))]
pub async fn form(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Path(path): Path<RootPath>,
) -> Result<Response, AdminError> {
    let root = path.root()?;
    let target = EditTarget::Root {
        root,
        path: path.path.clone(),
    };
    let contents = state.content().read(&target).await?;
    let flash = state.sessions().flash().take(&session).await?;
    let (dir, file_name) = split_rel(&path.path);

    let template = EditTemplate {
        flash,
        language: language_for(file_name),
        file_name: file_name.to_string(),
        location: if dir.is_empty() {
            root.to_string()
        } else {
            format!("{}/{}", root, dir)
        },
        contents,
        action: edit_url(root, &path.path),
        back_href: list_url(root, dir),
        preview_css: state.config().preview_css.clone(),
        is_config: false,
    };
    Ok(template.into_response())
}

#[tracing::instrument(skip(state, session, form), fields(len = form.contents.len()))]
pub async fn save(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Path(path): Path<RootPath>,
    Form(form): Form<SaveForm>,
) -> Result<Response, AdminError> {
    let root = path.root()?;
    let target = EditTarget::Root {
        root,
        path: path.path.clone(),
    };
    let change = state.content().save(&target, &form.contents).await?;
    let redirect_to = if form.save_and_edit.is_some() {
        edit_url(root, &path.path)
    } else {
        list_url(root, split_rel(&path.path).0)
    };
    finish_change(&state, &session, change, &redirect_to).await
}

#[tracing::instrument(skip_all)]
pub async fn config_form(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AdminError> {
    let contents = state.content().read(&EditTarget::Config).await?;
    let flash = state.sessions().flash().take(&session).await?;
    let template = EditTemplate {
        flash,
        file_name: SITE_CONFIG_FILE_NAME.to_string(),
        location: String::new(),
        contents,
        language: "yaml",
        action: admin_url("/edit-config/"),
        back_href: admin_url("/"),
        preview_css: None,
        is_config: true,
    };
    Ok(template.into_response())
}

#[tracing::instrument(skip_all, fields(len = form.contents.len()))]
pub async fn config_save(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Form(form): Form<SaveForm>,
) -> Result<Response, AdminError> {
    let change = state.content().save(&EditTarget::Config, &form.contents).await?;
    let redirect_to = if form.save_and_edit.is_some() {
        admin_url("/edit-config/")
    } else {
        admin_url("/")
    };
    finish_change(&state, &session, change, &redirect_to).await
}
