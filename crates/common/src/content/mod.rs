//! Validated mutations over the content roots and the site configuration.
//!
//! - **[`ContentRepository`]**: list, create, delete, move, save and upload
//! - **[`metadata`]**: front matter date management applied on save
//! - **[`upload`]**: naming rules for uploaded files
//! - **[`slug`]**: filesystem-safe, diacritic-insensitive slugs
//!
//! Every operation resolves its paths through [`crate::path_guard`] before
//! touching the disk, and every write either fully lands or leaves the
//! previous contents untouched.

mod editable;
mod listing;
pub mod metadata;
mod moves;
mod repository;
pub mod slug;
pub mod upload;

use std::path::PathBuf;

use crate::build::BuildMode;
use crate::error::ErrorKind;
use crate::layout::Root;
use crate::path_guard::PathError;

pub use editable::{check_editable, EDITABLE_EXTENSIONS};
pub use listing::{DirEntry, Listing, SortOrder, PAGE_SIZE};
pub use moves::{MoveOutcome, MoveRequest};
pub use repository::{ContentRepository, UploadRequest};

/// What the editor is pointed at: a file inside a root or the site config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Root { root: Root, path: String },
    Config,
}

/// The result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Absolute path of the created, saved or moved entry
    pub path: PathBuf,
    /// Final path component, e.g. the stored name of an upload
    pub name: String,
    /// Operator-facing description, used for the flash and the audit log
    pub message: String,
    /// How much of the site has to be regenerated
    pub rebuild: BuildMode,
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("a directory/file of that name already exists: {0}")]
    AlreadyExists(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("directory is not empty: {0}")]
    NotEmpty(String),
    #[error("{0}")]
    PolicyViolation(String),
    #[error("a valid file extension is required: {0}")]
    MissingExtension(String),
    #[error("could not move {0} across filesystems; nothing was changed")]
    CrossDeviceMove(String),
    #[error("I/O error while {operation} at {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContentError::Path(e) => e.kind(),
            ContentError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            ContentError::NotFound(_) => ErrorKind::NotFound,
            ContentError::NotEmpty(_) => ErrorKind::NotEmpty,
            ContentError::PolicyViolation(_) => ErrorKind::PolicyViolation,
            ContentError::MissingExtension(_) => ErrorKind::MissingExtension,
            ContentError::CrossDeviceMove(_) => ErrorKind::CrossDeviceMove,
            ContentError::Io { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ContentError::Io {
            operation,
            path,
            source,
        }
    }
}
