use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use walkdir::WalkDir;

use super::listing::{DirEntry, Listing, SortOrder};
use super::{check_editable, metadata, slug, upload, Change, ContentError, EditTarget};
use crate::build::BuildMode;
use crate::config::AdminConfig;
use crate::layout::{Root, SiteLayout, SITE_CONFIG_FILE_NAME};
use crate::path_guard::{self, PathError};

const MAX_UPLOAD_ATTEMPTS: usize = 8;

/// A file received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// `root` or `root/sub/dir`
    pub dest: String,
    /// Explicit target name; derived from `source_filename` when blank
    pub declared_name: Option<String>,
    pub source_filename: String,
    pub bytes: Vec<u8>,
}

/// Filesystem operations over the content roots and the site configuration.
#[derive(Debug, Clone)]
pub struct ContentRepository {
    pub(super) layout: SiteLayout,
    pub(super) config: Arc<AdminConfig>,
}

impl ContentRepository {
    pub fn new(layout: SiteLayout, config: Arc<AdminConfig>) -> Self {
        Self { layout, config }
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    pub async fn list(
        &self,
        root: Root,
        dir: &str,
        sort: SortOrder,
        search: Option<&str>,
        page: usize,
    ) -> Result<Listing, ContentError> {
        let path = path_guard::resolve(&self.layout, root, dir)?;
        require_dir(&path, &location(root, dir)).await?;

        let mut reader = fs::read_dir(&path)
            .await
            .map_err(ContentError::io("listing directory", &path))?;
        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(ContentError::io("listing directory", &path))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::debug!(name = %name, "skipping unreadable entry: {}", e);
                    continue;
                }
            };
            entries.push(DirEntry {
                name,
                is_directory: meta.is_dir(),
                size: meta.len(),
                modified_at: meta
                    .modified()
                    .map(DateTime::<Local>::from)
                    .unwrap_or_else(|_| Local::now()),
            });
        }

        Ok(Listing::paginate(
            root,
            dir.trim_matches('/').to_string(),
            entries,
            sort,
            search,
            page,
        ))
    }

    /// Create an empty file. Existing entries are never overwritten.
    #[tracing::instrument(skip(self))]
    pub async fn create_file(
        &self,
        root: Root,
        dir: &str,
        name: &str,
    ) -> Result<Change, ContentError> {
        let (path, name) = self.new_entry_path(root, dir, name).await?;
        create_new(&path, &[], &name).await?;
        Ok(Change {
            message: format!("Created file {} in {}", name, location(root, dir)),
            path,
            name,
            rebuild: BuildMode::Normal,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_directory(
        &self,
        root: Root,
        dir: &str,
        name: &str,
    ) -> Result<Change, ContentError> {
        let (path, name) = self.new_entry_path(root, dir, name).await?;
        fs::create_dir(&path).await.map_err(|e| {
            if e.kind() == IoErrorKind::AlreadyExists {
                ContentError::AlreadyExists(name.clone())
            } else {
                ContentError::io("creating directory", &path)(e)
            }
        })?;
        Ok(Change {
            message: format!("Created directory {} in {}", name, location(root, dir)),
            path,
            name,
            rebuild: BuildMode::Normal,
        })
    }

    /// Create a markdown page named after the slug of `title`.
    #[tracing::instrument(skip(self))]
    pub async fn create_page(
        &self,
        root: Root,
        dir: &str,
        title: &str,
    ) -> Result<Change, ContentError> {
        let title = title.trim();
        let stem = slug::slugify(title);
        if stem.is_empty() {
            return Err(PathError::EmptyName.into());
        }
        let (path, name) = self
            .new_entry_path(root, dir, &format!("{}.md", stem))
            .await?;

        let quoted = serde_yaml::to_string(title)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{:?}", title));
        let header = format!("---\ntitle: {}\n---\n\n", quoted);
        let body = metadata::inject(&header, self.config.metadata_fields_for(&name), Local::now());
        create_new(&path, body.as_bytes(), &name).await?;

        Ok(Change {
            message: format!("Created page {} in {}", name, location(root, dir)),
            path,
            name,
            rebuild: BuildMode::Normal,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_file(&self, root: Root, path: &str) -> Result<Change, ContentError> {
        let full = path_guard::resolve_entry(&self.layout, root, path)?;
        let meta = existing(&full, path).await?;
        if meta.is_dir() {
            return Err(ContentError::PolicyViolation(format!(
                "{} is a directory; remove it as a directory instead",
                path
            )));
        }
        fs::remove_file(&full)
            .await
            .map_err(ContentError::io("deleting file", &full))?;

        let (dir, name) = split_parent(path);
        Ok(Change {
            message: format!("Deleted file {} from {}", name, location(root, dir)),
            path: full,
            name: name.to_string(),
            rebuild: BuildMode::Normal,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_directory(&self, root: Root, path: &str) -> Result<Change, ContentError> {
        let full = path_guard::resolve_entry(&self.layout, root, path)?;
        let meta = existing(&full, path).await?;
        if !meta.is_dir() {
            return Err(ContentError::PolicyViolation(format!(
                "{} is not a directory",
                path
            )));
        }
        let mut children = fs::read_dir(&full)
            .await
            .map_err(ContentError::io("reading directory", &full))?;
        if children
            .next_entry()
            .await
            .map_err(ContentError::io("reading directory", &full))?
            .is_some()
        {
            return Err(ContentError::NotEmpty(path.to_string()));
        }
        fs::remove_dir(&full).await.map_err(|e| {
            if e.kind() == IoErrorKind::NotFound {
                ContentError::NotFound(path.to_string())
            } else if full.read_dir().map(|mut d| d.next().is_some()).unwrap_or(false) {
                ContentError::NotEmpty(path.to_string())
            } else {
                ContentError::io("removing directory", &full)(e)
            }
        })?;

        let (dir, name) = split_parent(path);
        Ok(Change {
            message: format!("Removed directory {} from {}", name, location(root, dir)),
            path: full,
            name: name.to_string(),
            rebuild: BuildMode::Normal,
        })
    }

    /// Contents of an editable file.
    pub async fn read(&self, target: &EditTarget) -> Result<String, ContentError> {
        let (path, name) = self.edit_path(target)?;
        check_editable(&name)?;
        let meta = existing(&path, &name).await?;
        if meta.is_dir() {
            return Err(ContentError::PolicyViolation(format!(
                "{} is a directory",
                name
            )));
        }
        fs::read_to_string(&path)
            .await
            .map_err(ContentError::io("reading file", &path))
    }

    /// Replace an existing editable file with `contents`.
    ///
    /// Line endings are normalized to `\n` and registered metadata fields are
    /// maintained. The file on disk is swapped in one rename.
    #[tracing::instrument(skip(self, contents), fields(len = contents.len()))]
    pub async fn save(&self, target: &EditTarget, contents: &str) -> Result<Change, ContentError> {
        let (path, name) = self.edit_path(target)?;
        check_editable(&name)?;
        let meta = existing(&path, &name).await?;
        if meta.is_dir() {
            return Err(ContentError::PolicyViolation(format!(
                "{} is a directory",
                name
            )));
        }

        let normalized = contents.replace("\r\n", "\n");
        let (text, message, rebuild) = match target {
            EditTarget::Config => (
                normalized,
                format!("Updated the site configuration file {}", SITE_CONFIG_FILE_NAME),
                BuildMode::Normal,
            ),
            EditTarget::Root { root, path: rel } => {
                let fields = self.config.metadata_fields_for(&name);
                let text = metadata::inject(&normalized, fields, Local::now());
                let (dir, _) = split_parent(rel);
                let rebuild = match root {
                    Root::Content => BuildMode::Quick,
                    Root::Data | Root::Static => BuildMode::Normal,
                };
                (
                    text,
                    format!("Saved file {} in {}", name, location(*root, dir)),
                    rebuild,
                )
            }
        };
        write_atomically(&path, text.as_bytes()).await?;

        Ok(Change {
            path,
            name,
            message,
            rebuild,
        })
    }

    /// Store an uploaded file without ever replacing an existing one.
    #[tracing::instrument(skip(self, request), fields(dest = %request.dest, len = request.bytes.len()))]
    pub async fn accept_upload(&self, request: UploadRequest) -> Result<Change, ContentError> {
        let (root, dir) = path_guard::parse_root_path(&request.dest)?;
        let dir_path = path_guard::resolve(&self.layout, root, &dir)?;
        require_dir(&dir_path, &location(root, &dir)).await?;

        let declared = request
            .declared_name
            .as_deref()
            .map(|n| n.trim().trim_matches('/'))
            .filter(|n| !n.is_empty());
        let (base, automatic) = match declared {
            Some(name) => (name.to_string(), false),
            None => (upload::derive_name(&request.source_filename), true),
        };
        path_guard::validate_name(&base)?;
        if !upload::has_valid_extension(&base) {
            return Err(ContentError::MissingExtension(base));
        }

        // declared names are taken as given; derived ones may be disambiguated
        let retries = if automatic { MAX_UPLOAD_ATTEMPTS } else { 0 };
        let mut names =
            std::iter::once(base.clone()).chain(upload::candidates(&base).take(retries));
        let (path, name) = loop {
            let Some(name) = names.next() else {
                return Err(ContentError::AlreadyExists(format!(
                    "{}/{}",
                    location(root, &dir),
                    base
                )));
            };
            let path = path_guard::resolve_entry(
                &self.layout,
                root,
                &path_guard::join_relative(&dir, &name),
            )?;
            match create_new(&path, &request.bytes, &name).await {
                Ok(()) => break (path, name),
                Err(ContentError::AlreadyExists(_)) if automatic => {
                    tracing::debug!(taken = %name, "upload name collision");
                }
                Err(e) => return Err(e),
            }
        };

        Ok(Change {
            message: format!("File {} uploaded to {}", name, location(root, &dir)),
            path,
            name,
            rebuild: BuildMode::Normal,
        })
    }

    /// Every root and each directory below it as `root/sub/dir`, sorted.
    pub async fn directories(&self) -> Result<Vec<String>, ContentError> {
        let layout = self.layout.clone();
        let base = layout.base_dir().to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut dirs = Vec::new();
            for root in Root::ALL {
                let root_dir = layout.root_dir(root);
                if !root_dir.is_dir() {
                    continue;
                }
                dirs.push(root.to_string());
                let walker = WalkDir::new(&root_dir)
                    .min_depth(1)
                    .into_iter()
                    .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));
                for entry in walker.filter_map(Result::ok) {
                    if entry.file_type().is_dir() {
                        dirs.push(layout.display_path(entry.path()).replace('\\', "/"));
                    }
                }
            }
            dirs.sort();
            dirs
        })
        .await
        .map_err(|e| ContentError::io("walking directories", base)(std::io::Error::other(e)))
    }

    async fn new_entry_path(
        &self,
        root: Root,
        dir: &str,
        name: &str,
    ) -> Result<(PathBuf, String), ContentError> {
        let name = path_guard::validate_name(name.trim())?.to_string();
        let dir_path = path_guard::resolve(&self.layout, root, dir)?;
        require_dir(&dir_path, &location(root, dir)).await?;
        let path =
            path_guard::resolve_entry(&self.layout, root, &path_guard::join_relative(dir, &name))?;
        Ok((path, name))
    }

    fn edit_path(&self, target: &EditTarget) -> Result<(PathBuf, String), ContentError> {
        match target {
            EditTarget::Config => Ok((
                path_guard::resolve_config(&self.layout),
                SITE_CONFIG_FILE_NAME.to_string(),
            )),
            EditTarget::Root { root, path } => {
                let full = path_guard::resolve_entry(&self.layout, *root, path)?;
                let (_, name) = split_parent(path);
                Ok((full, name.to_string()))
            }
        }
    }
}

/// `content` or `content/posts`.
pub(super) fn location(root: Root, dir: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        root.to_string()
    } else {
        format!("{}/{}", root, dir)
    }
}

/// Split `a/b/c.md` into (`a/b`, `c.md`).
fn split_parent(path: &str) -> (&str, &str) {
    match path.trim_matches('/').rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", path.trim_matches('/')),
    }
}

async fn require_dir(path: &Path, shown: &str) -> Result<(), ContentError> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ContentError::NotFound(format!("{} is not a directory", shown))),
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            Err(ContentError::NotFound(format!("directory {}", shown)))
        }
        Err(e) => Err(ContentError::io("inspecting directory", path)(e)),
    }
}

pub(super) async fn existing(path: &Path, shown: &str) -> Result<std::fs::Metadata, ContentError> {
    match fs::symlink_metadata(path).await {
        Ok(meta) => Ok(meta),
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            Err(ContentError::NotFound(shown.to_string()))
        }
        Err(e) => Err(ContentError::io("inspecting", path)(e)),
    }
}

async fn create_new(path: &Path, bytes: &[u8], name: &str) -> Result<(), ContentError> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| {
            if e.kind() == IoErrorKind::AlreadyExists {
                ContentError::AlreadyExists(name.to_string())
            } else {
                ContentError::io("creating file", path)(e)
            }
        })?;
    if bytes.is_empty() {
        return Ok(());
    }
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = written {
        drop(file);
        let _ = fs::remove_file(path).await;
        return Err(ContentError::io("writing file", path)(e));
    }
    Ok(())
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ContentError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));
    if let Err(e) = fs::write(&staging, bytes).await {
        let _ = fs::remove_file(&staging).await;
        return Err(ContentError::io("writing file", &staging)(e));
    }
    if let Err(e) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(ContentError::io("replacing file", path)(e));
    }
    Ok(())
}
