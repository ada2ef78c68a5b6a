use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Extension;

use common::config::site_title;
use common::prelude::*;

use crate::daemon::http_server::error::AdminError;
use crate::ServiceState;

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub flash: Option<FlashMessage>,
    pub site_title: Option<String>,
    pub roots: Vec<Root>,
    pub can_deploy: bool,
    pub logged_in_since: String,
}

#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AdminError> {
    let flash = state.sessions().flash().take(&session).await?;
    let layout = state.layout().clone();
    let site_title = tokio::task::spawn_blocking(move || site_title(&layout))
        .await
        .unwrap_or_default();

    let template = IndexTemplate {
        flash,
        site_title,
        roots: Root::ALL.to_vec(),
        can_deploy: state.config().deploy_command().is_some(),
        logged_in_since: session.created_at.format("%Y-%m-%d %H:%M").to_string(),
    };
    Ok(template.into_response())
}
