/**
 * Immutable description of where everything lives
 *  on disk for one site.
 */
pub mod layout;
/**
 * Admin configuration (credentials, generator,
 *  automatic metadata) loaded from YAML.
 */
pub mod config;
/**
 * Closed classification of every error the core
 *  can surface to a client.
 */
pub mod error;
/**
 * Sandboxing of root-relative paths and bare names.
 */
pub mod path_guard;
/**
 * File-backed sessions and one-shot flash messages.
 */
pub mod session;
/**
 * Validated mutations over the content roots and
 *  the site configuration file.
 */
pub mod content;
/**
 * Serialized invocation of the external site generator
 *  and the append-only audit log.
 */
pub mod build;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::build::{
        BuildCoordinator, BuildError, BuildHandle, BuildMode, BuildOutcome, BuildRecord,
        BuildReport,
    };
    pub use crate::config::{
        AdminConfig, CommandSpec, ConfigError, GeneratorConfig, MetadataField,
    };
    pub use crate::content::{
        Change, ContentError, ContentRepository, DirEntry, EditTarget, Listing, MoveOutcome,
        MoveRequest, SortOrder, UploadRequest,
    };
    pub use crate::error::ErrorKind;
    pub use crate::layout::{Root, SiteLayout};
    pub use crate::path_guard::PathError;
    pub use crate::session::{
        FlashChannel, FlashMessage, LoginOutcome, Session, SessionError, SessionStore, Severity,
    };
    pub use crate::version::build_info;
}
