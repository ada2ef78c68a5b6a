//! Error classification shared by every core module.
//!
//! Each module keeps its own `thiserror` enum; `kind()` on those enums
//! collapses them into [`ErrorKind`], which is what the HTTP layer maps to
//! status codes.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A path resolved outside of its root.
    PathEscape,
    /// A bare name was empty, contained a separator or started with a dot.
    InvalidName,
    AlreadyExists,
    NotFound,
    NotEmpty,
    /// Anything else the operator is not allowed to do.
    PolicyViolation,
    /// A file name carries no usable extension.
    MissingExtension,
    CrossDeviceMove,
    BuildTimedOut,
    BuildFailed,
    ConfigurationError,
    BadCredentials,
    Internal,
}

impl ErrorKind {
    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ErrorKind::BuildTimedOut | ErrorKind::BuildFailed | ErrorKind::Internal
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::PathEscape => "path escape",
            ErrorKind::InvalidName => "invalid name",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::NotFound => "not found",
            ErrorKind::NotEmpty => "not empty",
            ErrorKind::PolicyViolation => "policy violation",
            ErrorKind::MissingExtension => "missing extension",
            ErrorKind::CrossDeviceMove => "cross-device move",
            ErrorKind::BuildTimedOut => "build timed out",
            ErrorKind::BuildFailed => "build failed",
            ErrorKind::ConfigurationError => "configuration error",
            ErrorKind::BadCredentials => "bad credentials",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(name)
    }
}
