//! Operator-facing pages under `/_/admin`.
//!
//! Handlers validate nothing themselves; the content repository owns every
//! rule. A handler's job is to extract the request, call one repository
//! operation, then rebuild, flash and redirect.

use axum::middleware;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use common::path_guard;
use common::prelude::*;

use super::auth;
use super::error::AdminError;
use super::ADMIN_PREFIX;
use crate::ServiceState;

mod build;
mod create;
mod delete;
mod edit;
mod index;
mod list;
mod login;
mod moves;
mod preview;
mod upload;

/// `/_/admin` + `path`.
pub fn admin_url(path: &str) -> String {
    format!("{}{}", ADMIN_PREFIX, path)
}

pub fn list_url(root: Root, dir: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        admin_url(&format!("/list/{}", root))
    } else {
        admin_url(&format!("/list/{}/{}", root, dir))
    }
}

pub fn edit_url(root: Root, path: &str) -> String {
    admin_url(&format!("/edit/{}/{}", root, path.trim_matches('/')))
}

/// `:root` with an optional trailing `*dir` or `*path`.
#[derive(Debug, Deserialize)]
pub struct RootPath {
    pub root: String,
    #[serde(default)]
    pub path: String,
}

impl RootPath {
    pub fn root(&self) -> Result<Root, AdminError> {
        self.root
            .parse::<Root>()
            .map_err(|_| PathError::UnknownRoot(self.root.clone()).into())
    }
}

/// Rebuild after a successful mutation, tell the operator how it went and
/// send them to `redirect_to`.
///
/// A build that fails or times out does not fail the request; its advisory
/// is appended to the flash as a warning instead.
pub async fn finish_change(
    state: &ServiceState,
    session: &Session,
    change: Change,
    redirect_to: &str,
) -> Result<Response, AdminError> {
    tracing::info!(path = %change.path.display(), mode = %change.rebuild, "{}", change.message);
    let report = state
        .builds()
        .rebuild(Some(change.message.clone()), change.rebuild)
        .await?;
    let (text, severity) = match report.advisory() {
        Some(advisory) => (format!("{} {}", change.message, advisory), Severity::Warning),
        None => (change.message, Severity::Success),
    };
    state.sessions().flash().set(session, &text, severity).await?;
    Ok(Redirect::to(redirect_to).into_response())
}

/// The location string `root[/dir]` split back into its parts, rejecting
/// anything outside the sanctioned roots.
pub fn parse_location(combined: &str) -> Result<(Root, String), AdminError> {
    Ok(path_guard::parse_root_path(combined)?)
}

pub fn router(state: ServiceState) -> Router<ServiceState> {
    let protected = Router::new()
        .route(ADMIN_PREFIX, get(index::handler))
        .route(&admin_url("/"), get(index::handler))
        .route(&admin_url("/list/:root"), get(list::handler))
        .route(&admin_url("/list/:root/*path"), get(list::handler))
        .route(&admin_url("/create-file/:root"), post(create::file))
        .route(&admin_url("/create-file/:root/*path"), post(create::file))
        .route(&admin_url("/create-dir/:root"), post(create::directory))
        .route(&admin_url("/create-dir/:root/*path"), post(create::directory))
        .route(&admin_url("/create-page/:root"), post(create::page))
        .route(&admin_url("/create-page/:root/*path"), post(create::page))
        .route(&admin_url("/delete/:root/*path"), get(delete::file))
        .route(&admin_url("/rmdir/:root/*path"), get(delete::directory))
        .route(&admin_url("/move/"), post(moves::handler))
        .route(
            &admin_url("/edit/:root/*path"),
            get(edit::form).post(edit::save),
        )
        .route(
            &admin_url("/edit-config/"),
            get(edit::config_form).post(edit::config_save),
        )
        .route(&admin_url("/upload/"), get(upload::form).post(upload::submit))
        .route(&admin_url("/build/"), get(build::rebuild))
        .route(&admin_url("/deploy/"), get(build::deploy))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route(&admin_url("/login/"), get(login::form).post(login::submit))
        .route(&admin_url("/logout/"), get(login::logout))
        .route(&admin_url("/preview/"), post(preview::handler))
        .merge(protected)
}
