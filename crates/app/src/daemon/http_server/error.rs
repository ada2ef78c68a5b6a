use askama::Template;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use common::prelude::{BuildError, ContentError, ErrorKind, PathError, SessionError};

#[derive(Template)]
#[template(path = "pages/error.html")]
struct ErrorTemplate {
    status: u16,
    reason: String,
    message: String,
}

/// Everything an admin handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("{0}")]
    BadRequest(String),
}

impl AdminError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AdminError::Content(e) => Some(e.kind()),
            AdminError::Path(e) => Some(e.kind()),
            AdminError::Session(e) => Some(e.kind()),
            AdminError::Build(e) => Some(e.kind()),
            AdminError::BadRequest(_) => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind()
            .map(status_for)
            .unwrap_or(StatusCode::BAD_REQUEST)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::MissingExtension => StatusCode::METHOD_NOT_ALLOWED,
        ErrorKind::BadCredentials => StatusCode::UNAUTHORIZED,
        ErrorKind::PathEscape
        | ErrorKind::InvalidName
        | ErrorKind::AlreadyExists
        | ErrorKind::NotEmpty
        | ErrorKind::PolicyViolation
        | ErrorKind::CrossDeviceMove
        | ErrorKind::ConfigurationError => StatusCode::FORBIDDEN,
        ErrorKind::BuildTimedOut => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::BuildFailed | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, "admin request failed: {}", self);
        } else {
            tracing::warn!(%status, "admin request rejected: {}", self);
        }

        // internals stay in the log
        let message = match self.kind() {
            Some(ErrorKind::Internal) => "An internal error occurred; see the server log.".to_string(),
            _ => self.to_string(),
        };
        let template = ErrorTemplate {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
        };
        (status, template).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::PathEscape), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::PolicyViolation), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorKind::ConfigurationError),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(ErrorKind::BuildFailed),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(ErrorKind::MissingExtension),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AdminError::BadRequest("missing field".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_every_client_kind_maps_to_client_status() {
        let kinds = [
            ErrorKind::PathEscape,
            ErrorKind::InvalidName,
            ErrorKind::AlreadyExists,
            ErrorKind::NotFound,
            ErrorKind::NotEmpty,
            ErrorKind::PolicyViolation,
            ErrorKind::MissingExtension,
            ErrorKind::CrossDeviceMove,
            ErrorKind::BuildTimedOut,
            ErrorKind::BuildFailed,
            ErrorKind::ConfigurationError,
            ErrorKind::BadCredentials,
            ErrorKind::Internal,
        ];
        for kind in kinds {
            assert_eq!(
                kind.is_client_error(),
                status_for(kind).is_client_error(),
                "{}",
                kind
            );
        }
    }
}
