use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use common::prelude::Session;

use super::ADMIN_PREFIX;
use crate::ServiceState;

pub fn login_path() -> String {
    format!("{}/login/", ADMIN_PREFIX)
}

/// Gate for every admin route except login, logout and preview.
///
/// A valid session is handed to the handler as a request extension; anything
/// else is sent to the login page.
pub async fn require_session(
    State(state): State<ServiceState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match jar.get(state.sessions().cookie_name()) {
        Some(cookie) => state.sessions().validate(cookie.value()).await,
        None => None,
    };
    let Some(session) = session else {
        tracing::debug!(path = %request.uri().path(), "no valid session, redirecting to login");
        return Redirect::to(&login_path()).into_response();
    };

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

pub fn session_cookie(name: &str, session: &Session) -> Cookie<'static> {
    Cookie::build((name.to_string(), session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session_cookie(jar: CookieJar, name: &str) -> CookieJar {
    jar.remove(Cookie::build(name.to_string()).path("/"))
}
