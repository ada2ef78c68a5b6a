use askama::Template;
use axum::extract::{Multipart, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde::Deserialize;

use common::prelude::*;

use super::{finish_change, list_url, parse_location};
use crate::daemon::http_server::error::AdminError;
use crate::ServiceState;

#[derive(Template)]
#[template(path = "pages/upload.html")]
pub struct UploadTemplate {
    pub flash: Option<FlashMessage>,
    pub directories: Vec<String>,
    pub selected: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub dest: Option<String>,
}

#[tracing::instrument(skip(state, session))]
pub async fn form(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Query(query): Query<UploadQuery>,
) -> Result<Response, AdminError> {
    let directories = state.content().directories().await?;
    let flash = state.sessions().flash().take(&session).await?;
    let template = UploadTemplate {
        flash,
        directories,
        selected: query.dest.unwrap_or_else(|| Root::Static.to_string()),
    };
    Ok(template.into_response())
}

/// Accepts `dest_dir`, an optional `dest_name` and the `upload` file part.
#[tracing::instrument(skip_all)]
pub async fn submit(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<Response, AdminError> {
    let mut dest = None;
    let mut declared_name = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AdminError::BadRequest(format!("malformed upload: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("dest_dir") => {
                dest = Some(field.text().await.map_err(bad_field)?);
            }
            Some("dest_name") => {
                declared_name = Some(field.text().await.map_err(bad_field)?);
            }
            Some("upload") => {
                let source_filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad_field)?;
                file = Some((source_filename, bytes.to_vec()));
            }
            other => {
                tracing::debug!(field = ?other, "ignoring unexpected upload field");
            }
        }
    }

    let dest = dest.ok_or_else(|| AdminError::BadRequest("dest_dir is required".into()))?;
    let (source_filename, bytes) =
        file.ok_or_else(|| AdminError::BadRequest("no file was uploaded".into()))?;
    // validated again by the repository; parsed here for the redirect
    let (root, dir) = parse_location(&dest)?;

    let change = state
        .content()
        .accept_upload(UploadRequest {
            dest,
            declared_name,
            source_filename,
            bytes,
        })
        .await?;
    finish_change(&state, &session, change, &list_url(root, &dir)).await
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> AdminError {
    AdminError::BadRequest(format!("could not read upload field: {}", e))
}
