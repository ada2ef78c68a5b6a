//! Confinement of operator-supplied paths to the sanctioned roots.
//!
//! Every path that reaches the filesystem goes through [`resolve`] (for a
//! root-relative path) or [`validate_name`] (for a bare file or directory
//! name). Rejections are never auto-corrected.

use std::path::{Path, PathBuf};

use crate::error::ErrorKind;
use crate::layout::{Root, SiteLayout};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path escapes its root: {0}")]
    Escape(String),
    #[error("names must not start with a dot: {0}")]
    Hidden(String),
    #[error("name must not be empty")]
    EmptyName,
    #[error("slashes are not allowed in names: {0}")]
    SlashInName(String),
    #[error("not an authorized directory: {0}")]
    UnknownRoot(String),
}

impl PathError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PathError::Escape(_) => ErrorKind::PathEscape,
            PathError::Hidden(_) | PathError::EmptyName | PathError::SlashInName(_) => {
                ErrorKind::InvalidName
            }
            PathError::UnknownRoot(_) => ErrorKind::PolicyViolation,
        }
    }
}

/// Resolve `relative` inside `root`. An empty path resolves to the root
/// directory itself.
pub fn resolve(layout: &SiteLayout, root: Root, relative: &str) -> Result<PathBuf, PathError> {
    let base = layout.root_dir(root);
    let segments = checked_segments(relative)?;
    let joined = segments.iter().fold(base.clone(), |acc, seg| acc.join(seg));
    ensure_contained(&base, &joined, relative)?;
    Ok(joined)
}

/// Like [`resolve`], but the result must be a strict descendant of the root.
pub fn resolve_entry(
    layout: &SiteLayout,
    root: Root,
    relative: &str,
) -> Result<PathBuf, PathError> {
    if relative.trim_matches('/').is_empty() {
        return Err(PathError::Escape(format!("{}/", root)));
    }
    resolve(layout, root, relative)
}

/// The site configuration file, the one editable target outside the roots.
pub fn resolve_config(layout: &SiteLayout) -> PathBuf {
    layout.config_file()
}

/// Check a bare name for a new file or directory.
pub fn validate_name(name: &str) -> Result<&str, PathError> {
    if name.is_empty() {
        return Err(PathError::EmptyName);
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(PathError::SlashInName(name.to_string()));
    }
    if name.starts_with('.') {
        return Err(PathError::Hidden(name.to_string()));
    }
    Ok(name)
}

/// Split a combined `root/sub/dir` string as used by upload and move forms.
pub fn parse_root_path(combined: &str) -> Result<(Root, String), PathError> {
    let trimmed = combined.trim_matches('/');
    let (root, rest) = match trimmed.split_once('/') {
        Some((root, rest)) => (root, rest),
        None => (trimmed, ""),
    };
    let root = root
        .parse::<Root>()
        .map_err(|_| PathError::UnknownRoot(combined.to_string()))?;
    // validate now so callers get the rejection before touching anything
    checked_segments(rest)?;
    Ok((root, rest.to_string()))
}

/// Join a root-relative directory and a name with `/`.
pub fn join_relative(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

fn checked_segments(relative: &str) -> Result<Vec<&str>, PathError> {
    if relative.contains('\0') {
        return Err(PathError::Escape(relative.replace('\0', "\\0")));
    }
    if relative.starts_with('/') || relative.starts_with('\\') || has_drive_prefix(relative) {
        return Err(PathError::Escape(relative.to_string()));
    }

    let mut segments = Vec::new();
    for seg in relative.split('/') {
        if seg.is_empty() {
            continue;
        }
        if seg == "." || seg == ".." || seg.contains('\\') {
            return Err(PathError::Escape(relative.to_string()));
        }
        if seg.starts_with('.') {
            return Err(PathError::Hidden(relative.to_string()));
        }
        segments.push(seg);
    }
    Ok(segments)
}

fn has_drive_prefix(relative: &str) -> bool {
    let bytes = relative.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn ensure_contained(base: &Path, joined: &Path, relative: &str) -> Result<(), PathError> {
    if !joined.starts_with(base) {
        return Err(PathError::Escape(relative.to_string()));
    }
    // symlinks inside a root must not lead out of it
    if let (Ok(real), Ok(real_base)) = (joined.canonicalize(), base.canonicalize()) {
        if !real.starts_with(&real_base) {
            return Err(PathError::Escape(relative.to_string()));
        }
    }
    Ok(())
}
