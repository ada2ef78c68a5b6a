//! File-backed sessions.
//!
//! A session exists exactly as long as its marker file `<token>.session`
//! exists in the work directory; there is no in-memory session table. Each
//! session may own one pending flash message in `<token>.flash`.

mod flash;
mod store;

use std::path::PathBuf;

use crate::error::ErrorKind;

pub use flash::{FlashChannel, FlashMessage, Severity};
pub use store::{
    sha256_hex, LoginOutcome, Session, SessionStore, PLAINTEXT_PASSWORD_ADVISORY,
};

pub(crate) const SESSION_EXTENSION: &str = "session";
pub(crate) const FLASH_EXTENSION: &str = "flash";

/// Tokens must consist of word characters only, so they can never name a
/// path outside the work directory.
pub fn is_well_formed_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("bad credentials")]
    BadCredentials,
    #[error("admin_password is missing from the admin configuration")]
    ConfigMissing,
    #[error("I/O error while {operation} at {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::BadCredentials => ErrorKind::BadCredentials,
            SessionError::ConfigMissing => ErrorKind::ConfigurationError,
            SessionError::Io { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| SessionError::Io {
            operation,
            path,
            source,
        }
    }
}
