use std::io;
use std::path::Path;

use tokio::fs;
use walkdir::WalkDir;

use super::repository::{existing, location, ContentRepository};
use super::{Change, ContentError};
use crate::build::BuildMode;
use crate::layout::Root;
use crate::path_guard;

/// Move and/or rename one entry, possibly across roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub from_root: Root,
    pub from_dir: String,
    pub orig_name: String,
    pub to_root: Root,
    pub to_dir: String,
    pub new_name: String,
    /// What the operator believes the entry is
    pub is_dir: bool,
}

impl MoveRequest {
    fn is_noop(&self) -> bool {
        self.from_root == self.to_root
            && self.from_dir.trim_matches('/') == self.to_dir.trim_matches('/')
            && self.orig_name == self.new_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Source and destination are the same; nothing to rebuild
    Unchanged,
    Moved(Change),
}

impl ContentRepository {
    #[tracing::instrument(skip(self))]
    pub async fn move_or_rename(&self, request: &MoveRequest) -> Result<MoveOutcome, ContentError> {
        let new_name = path_guard::validate_name(request.new_name.trim())?;
        let orig_name = path_guard::validate_name(&request.orig_name)?;
        if request.is_noop() {
            return Ok(MoveOutcome::Unchanged);
        }

        let from_loc = location(request.from_root, &request.from_dir);
        let to_loc = location(request.to_root, &request.to_dir);
        for (root, dir, shown) in [
            (request.from_root, &request.from_dir, &from_loc),
            (request.to_root, &request.to_dir, &to_loc),
        ] {
            let path = path_guard::resolve(&self.layout, root, dir)?;
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => {}
                _ => {
                    return Err(ContentError::NotFound(format!(
                        "directory {} (origin and destination must both exist)",
                        shown
                    )))
                }
            }
        }

        let source = path_guard::resolve_entry(
            &self.layout,
            request.from_root,
            &path_guard::join_relative(&request.from_dir, orig_name),
        )?;
        let target = path_guard::resolve_entry(
            &self.layout,
            request.to_root,
            &path_guard::join_relative(&request.to_dir, new_name),
        )?;

        let meta = existing(&source, &format!("{}/{}", from_loc, orig_name)).await?;
        if meta.is_dir() != request.is_dir {
            let expected = if request.is_dir { "directory" } else { "file" };
            return Err(ContentError::NotFound(format!(
                "{} {} in {}",
                expected, orig_name, from_loc
            )));
        }
        if fs::symlink_metadata(&target).await.is_ok() {
            return Err(ContentError::AlreadyExists(format!("{}/{}", to_loc, new_name)));
        }
        if meta.is_dir() && target.starts_with(&source) {
            return Err(ContentError::PolicyViolation(format!(
                "cannot move the directory {} into itself",
                orig_name
            )));
        }

        if let Err(e) = fs::rename(&source, &target).await {
            if !is_cross_device(&e) {
                return Err(ContentError::io("moving", &source)(e));
            }
            tracing::info!(
                from = %source.display(),
                to = %target.display(),
                "rename crosses devices, copying instead"
            );
            copy_then_remove(&source, &target, orig_name).await?;
        }

        let kind = if meta.is_dir() { "directory" } else { "file" };
        let message = if from_loc == to_loc {
            format!(
                "Renamed a {} from {} to {} (in {})",
                kind, orig_name, new_name, from_loc
            )
        } else if orig_name == new_name {
            format!("Moved the {} {} from {} to {}", kind, orig_name, from_loc, to_loc)
        } else {
            format!(
                "Moved the {} {} from {} to {} and gave it the new name {}",
                kind, orig_name, from_loc, to_loc, new_name
            )
        };
        tracing::info!("{}", message);

        Ok(MoveOutcome::Moved(Change {
            path: target,
            name: new_name.to_string(),
            message,
            rebuild: BuildMode::Normal,
        }))
    }
}

#[cfg(not(windows))]
fn is_cross_device(e: &io::Error) -> bool {
    // EXDEV
    e.raw_os_error() == Some(18)
}

#[cfg(windows)]
fn is_cross_device(e: &io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    e.raw_os_error() == Some(17)
}

/// Copy `source` to `target` and then remove `source`. On failure the
/// partial copy is removed and the source is left as it was.
async fn copy_then_remove(source: &Path, target: &Path, shown: &str) -> Result<(), ContentError> {
    let (src, dst) = (source.to_path_buf(), target.to_path_buf());
    let copied = tokio::task::spawn_blocking(move || copy_tree(&src, &dst))
        .await
        .unwrap_or_else(|e| Err(io::Error::other(e)));

    if let Err(e) = copied {
        tracing::warn!(source = %source.display(), "cross-device copy failed: {}", e);
        if let Err(e) = remove_tree(target).await {
            tracing::error!(target = %target.display(), "failed to remove partial copy: {}", e);
        }
        return Err(ContentError::CrossDeviceMove(shown.to_string()));
    }
    if let Err(e) = remove_tree(source).await {
        tracing::warn!(source = %source.display(), "could not remove source after copy: {}", e);
        if let Err(e) = remove_tree(target).await {
            tracing::error!(target = %target.display(), "failed to remove copy: {}", e);
        }
        return Err(ContentError::CrossDeviceMove(shown.to_string()));
    }
    Ok(())
}

fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    if !source.is_dir() {
        std::fs::copy(source, target)?;
        return Ok(());
    }
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let dest = target.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

async fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
        Ok(_) => fs::remove_file(path).await,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::AdminConfig;
    use crate::error::ErrorKind;
    use crate::layout::SiteLayout;

    fn repo(dir: &Path) -> ContentRepository {
        let layout = SiteLayout::new(dir);
        for root in Root::ALL {
            std::fs::create_dir_all(layout.root_dir(root)).unwrap();
        }
        ContentRepository::new(layout, Arc::new(AdminConfig::default()))
    }

    fn request(from: (Root, &str, &str), to: (Root, &str, &str)) -> MoveRequest {
        MoveRequest {
            from_root: from.0,
            from_dir: from.1.to_string(),
            orig_name: from.2.to_string(),
            to_root: to.0,
            to_dir: to.1.to_string(),
            new_name: to.2.to_string(),
            is_dir: false,
        }
    }

    #[tokio::test]
    async fn test_identical_move_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(dir.path());
        std::fs::write(dir.path().join("content/a.md"), "a").unwrap();

        let outcome = repo
            .move_or_rename(&request(
                (Root::Content, "", "a.md"),
                (Root::Content, "/", "a.md"),
            ))
            .await
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_move_messages() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(dir.path());
        std::fs::create_dir_all(dir.path().join("content/posts")).unwrap();
        std::fs::write(dir.path().join("content/posts/a.md"), "a").unwrap();

        let MoveOutcome::Moved(change) = repo
            .move_or_rename(&request(
                (Root::Content, "posts", "a.md"),
                (Root::Content, "posts", "b.md"),
            ))
            .await
            .unwrap()
        else {
            panic!("expected a move");
        };
        assert_eq!(change.message, "Renamed a file from a.md to b.md (in content/posts)");

        let MoveOutcome::Moved(change) = repo
            .move_or_rename(&request(
                (Root::Content, "posts", "b.md"),
                (Root::Content, "", "b.md"),
            ))
            .await
            .unwrap()
        else {
            panic!("expected a move");
        };
        assert_eq!(change.message, "Moved the file b.md from content/posts to content");

        let MoveOutcome::Moved(change) = repo
            .move_or_rename(&request(
                (Root::Content, "", "b.md"),
                (Root::Data, "", "c.md"),
            ))
            .await
            .unwrap()
        else {
            panic!("expected a move");
        };
        assert_eq!(
            change.message,
            "Moved the file b.md from content to data and gave it the new name c.md"
        );
        assert_eq!(std::fs::read_to_string(dir.path().join("data/c.md")).unwrap(), "a");
    }

    #[tokio::test]
    async fn test_move_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(dir.path());
        std::fs::write(dir.path().join("content/a.md"), "a").unwrap();
        std::fs::write(dir.path().join("content/b.md"), "b").unwrap();

        let err = repo
            .move_or_rename(&request(
                (Root::Content, "", "a.md"),
                (Root::Content, "", "b.md"),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read_to_string(dir.path().join("content/b.md")).unwrap(), "b");
    }

    #[tokio::test]
    async fn test_move_validation() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(dir.path());
        std::fs::create_dir_all(dir.path().join("content/docs/inner")).unwrap();
        std::fs::write(dir.path().join("content/a.md"), "a").unwrap();

        let err = repo
            .move_or_rename(&request((Root::Content, "", "a.md"), (Root::Content, "", ".a.md")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidName);

        let err = repo
            .move_or_rename(&request((Root::Content, "", "zz.md"), (Root::Data, "", "zz.md")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = repo
            .move_or_rename(&request((Root::Content, "", "a.md"), (Root::Data, "nope", "a.md")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let mut into_itself = request((Root::Content, "", "docs"), (Root::Content, "docs/inner", "docs"));
        into_itself.is_dir = true;
        let err = repo.move_or_rename(&into_itself).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
        assert!(dir.path().join("content/docs/inner").is_dir());
    }

    #[test]
    fn test_copy_tree_copies_nested_entries() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("a/b")).unwrap();
        std::fs::write(src.path().join("a/b/c.txt"), "c").unwrap();

        let target = dst.path().join("copy");
        copy_tree(&src.path().join("a"), &target).unwrap();
        assert_eq!(std::fs::read_to_string(target.join("b/c.txt")).unwrap(), "c");
    }

    #[tokio::test]
    async fn test_copy_then_remove_moves_a_tree() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("docs");
        std::fs::create_dir_all(source.join("inner")).unwrap();
        std::fs::write(source.join("inner/page.md"), "page").unwrap();
        let target = dir.path().join("moved");

        copy_then_remove(&source, &target, "docs").await.unwrap();
        assert!(!source.exists());
        assert_eq!(
            std::fs::read_to_string(target.join("inner/page.md")).unwrap(),
            "page"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_copy_leaves_no_partial_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("docs");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("page.md"), "page").unwrap();
        // copying follows the link and fails once the walk reaches it
        std::os::unix::fs::symlink(dir.path().join("missing"), source.join("dangling.md"))
            .unwrap();
        let target = dir.path().join("moved");

        let err = copy_then_remove(&source, &target, "docs").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CrossDeviceMove);
        assert!(!target.exists());
        assert_eq!(
            std::fs::read_to_string(source.join("page.md")).unwrap(),
            "page"
        );
    }
}
