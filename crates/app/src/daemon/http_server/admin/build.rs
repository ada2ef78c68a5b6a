use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;
use serde::Deserialize;

use common::prelude::*;

use super::admin_url;
use crate::daemon::http_server::error::AdminError;
use crate::ServiceState;

const MANUAL_REASON: &str = "Manually requested";

#[derive(Debug, Default, Deserialize)]
pub struct RebuildQuery {
    pub hard: Option<String>,
}

impl RebuildQuery {
    fn is_hard(&self) -> bool {
        matches!(self.hard.as_deref(), Some(v) if !v.is_empty() && v != "0")
    }
}

#[tracing::instrument(skip(state, session))]
pub async fn rebuild(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Query(query): Query<RebuildQuery>,
) -> Result<Response, AdminError> {
    let mode = if query.is_hard() {
        BuildMode::Hard
    } else {
        BuildMode::Normal
    };
    let report = state
        .builds()
        .rebuild(Some(MANUAL_REASON.to_string()), mode)
        .await?;

    let mut text = String::from("The site was rebuilt.");
    if mode == BuildMode::Hard {
        text.push_str(
            " The output directory and the render cache were removed first (hard rebuild).",
        );
    }
    let severity = match report.advisory() {
        Some(advisory) => {
            text = format!("{} {}", text, advisory);
            Severity::Warning
        }
        None => Severity::Success,
    };
    state.sessions().flash().set(&session, &text, severity).await?;
    Ok(Redirect::to(&admin_url("/")).into_response())
}

/// Hard rebuild followed by the configured deploy command.
///
/// A failed build or deploy is reported through the flash; only a missing
/// deploy command or a dead build worker is an error page.
#[tracing::instrument(skip(state, session))]
pub async fn deploy(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AdminError> {
    let command = state
        .config()
        .deploy_command()
        .cloned()
        .ok_or(BuildError::NoDeployCommand)?;

    let (text, severity) = match state.builds().deploy(command).await {
        Ok(report) => match report.advisory() {
            Some(advisory) => (
                format!("The site was rebuilt and deployed. {}", advisory),
                Severity::Warning,
            ),
            None => (
                "The site was rebuilt and deployed.".to_string(),
                Severity::Success,
            ),
        },
        Err(e @ (BuildError::WorkerGone | BuildError::NoDeployCommand)) => return Err(e.into()),
        Err(e) => {
            tracing::warn!("deploy failed: {}", e);
            (
                format!("Deploy failed: {}. See tmp/admin.log for details.", e),
                Severity::Warning,
            )
        }
    };
    state.sessions().flash().set(&session, &text, severity).await?;
    Ok(Redirect::to(&admin_url("/")).into_response())
}
