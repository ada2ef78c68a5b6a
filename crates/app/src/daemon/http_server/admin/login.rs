use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use common::prelude::*;

use super::admin_url;
use crate::daemon::http_server::auth;
use crate::daemon::http_server::error::{status_for, AdminError};
use crate::ServiceState;

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub config_missing: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

fn no_store(status: StatusCode, template: LoginTemplate) -> Response {
    (status, [(header::CACHE_CONTROL, "no-store")], template).into_response()
}

#[tracing::instrument(skip_all)]
pub async fn form(State(state): State<ServiceState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(state.sessions().cookie_name()) {
        if state.sessions().validate(cookie.value()).await.is_some() {
            return Redirect::to(&admin_url("/")).into_response();
        }
    }
    let config_missing = state
        .config()
        .admin_password
        .as_deref()
        .unwrap_or_default()
        .is_empty();
    no_store(
        StatusCode::OK,
        LoginTemplate {
            error: None,
            config_missing,
        },
    )
}

#[tracing::instrument(skip_all)]
pub async fn submit(
    State(state): State<ServiceState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AdminError> {
    let configured = state.config().admin_password.as_deref();
    match state.sessions().login(&form.password, configured).await {
        Ok(outcome) => {
            let cookie = auth::session_cookie(state.sessions().cookie_name(), &outcome.session);
            Ok((jar.add(cookie), Redirect::to(&admin_url("/"))).into_response())
        }
        Err(e @ (SessionError::BadCredentials | SessionError::ConfigMissing)) => {
            let config_missing = matches!(e, SessionError::ConfigMissing);
            Ok(no_store(
                status_for(e.kind()),
                LoginTemplate {
                    error: Some(e.to_string()),
                    config_missing,
                },
            ))
        }
        Err(e) => Err(e.into()),
    }
}

#[tracing::instrument(skip_all)]
pub async fn logout(
    State(state): State<ServiceState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AdminError> {
    let name = state.sessions().cookie_name().to_string();
    if let Some(cookie) = jar.get(&name) {
        state.sessions().logout(cookie.value()).await?;
    }
    let jar = auth::clear_session_cookie(jar, &name);
    Ok((
        jar,
        [(header::CACHE_CONTROL, "no-store")],
        Redirect::to(&auth::login_path()),
    ))
}
