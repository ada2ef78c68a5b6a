//! Serialized, coalescing site regeneration.
//!
//! A single worker owns the generator. Callers enqueue jobs through a
//! cloneable [`BuildHandle`]; jobs that pile up while a build runs are
//! merged into one run and every caller receives the same [`BuildReport`].

mod coordinator;
mod process;
mod record;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::ErrorKind;

pub use coordinator::{BuildCoordinator, BuildHandle};
pub use record::BuildRecord;

/// Suffix added to the reason of destructive rebuilds.
pub const HARD_REBUILD_MARKER: &str = " - HARD REBUILD!";

/// How much work a build does. Ordered so that merging keeps the strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Incremental, passes the generator's quick arguments
    Quick,
    #[default]
    Normal,
    /// Purges the render cache and the output tree first
    Hard,
}

impl BuildMode {
    pub fn merge(self, other: BuildMode) -> BuildMode {
        self.max(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Quick => "quick",
            BuildMode::Normal => "normal",
            BuildMode::Hard => "hard",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    Succeeded,
    /// Non-zero exit, or the generator could not be started (`code` is `None`)
    Failed { code: Option<i32> },
    TimedOut,
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Succeeded)
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildOutcome::Succeeded => f.write_str("success"),
            BuildOutcome::Failed { code: Some(code) } => write!(f, "failed with exit code {}", code),
            BuildOutcome::Failed { code: None } => f.write_str("failed to start"),
            BuildOutcome::TimedOut => f.write_str("timed out"),
        }
    }
}

/// What a caller learns about the build that served its request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub outcome: BuildOutcome,
    pub mode: BuildMode,
    /// Merged reason of every coalesced request, if any had one
    pub reason: Option<String>,
    /// Generator output lines mentioning `WARN` or `ERR`
    pub diagnostics: Vec<String>,
    /// Number of requests served by this run
    pub requests: usize,
}

impl BuildReport {
    /// A non-fatal note for the operator when the build did not go cleanly.
    pub fn advisory(&self) -> Option<String> {
        match &self.outcome {
            BuildOutcome::TimedOut => Some(
                "The site build timed out; the published output may be incomplete. \
                 See tmp/admin.log for details."
                    .to_string(),
            ),
            BuildOutcome::Failed { .. } => Some(format!(
                "The site build {}. See tmp/admin.log for details.",
                self.outcome
            )),
            BuildOutcome::Succeeded if !self.diagnostics.is_empty() => Some(format!(
                "The site build reported {} warning/error line(s). See tmp/admin.log for details.",
                self.diagnostics.len()
            )),
            BuildOutcome::Succeeded => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("the build worker is no longer running")]
    WorkerGone,
    #[error("no deploy command is configured")]
    NoDeployCommand,
    #[error("build before deploy did not succeed: {0}")]
    BuildUnsuccessful(BuildOutcome),
    #[error("deploy command timed out after {0:?}")]
    DeployTimedOut(Duration),
    #[error("deploy command {0}")]
    DeployFailed(BuildOutcome),
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::WorkerGone => ErrorKind::Internal,
            BuildError::NoDeployCommand => ErrorKind::ConfigurationError,
            BuildError::BuildUnsuccessful(BuildOutcome::TimedOut) | BuildError::DeployTimedOut(_) => {
                ErrorKind::BuildTimedOut
            }
            BuildError::BuildUnsuccessful(_) | BuildError::DeployFailed(_) => ErrorKind::BuildFailed,
        }
    }
}
