use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

pub const SITE_CONFIG_FILE_NAME: &str = "wmk_config.yaml";
pub const ADMIN_CONFIG_FILE_NAME: &str = "wmk_admin.yaml";
pub const WORK_DIR_NAME: &str = "tmp";
pub const OUTPUT_DIR_NAME: &str = "htdocs";
pub const AUDIT_LOG_FILE_NAME: &str = "admin.log";

const COOKIE_PREFIX: &str = "siteadmin_";

/// One of the sanctioned top-level content directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Root {
    Content,
    Data,
    Static,
}

impl Root {
    pub const ALL: [Root; 3] = [Root::Content, Root::Data, Root::Static];

    pub fn as_str(&self) -> &'static str {
        match self {
            Root::Content => "content",
            Root::Data => "data",
            Root::Static => "static",
        }
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown root: {0}")]
pub struct UnknownRoot(pub String);

impl FromStr for Root {
    type Err = UnknownRoot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content" => Ok(Root::Content),
            "data" => Ok(Root::Data),
            "static" => Ok(Root::Static),
            other => Err(UnknownRoot(other.to_string())),
        }
    }
}

/// Where a site keeps its sources, its generated output and the admin's
/// private state. Built once at startup and handed to every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    base_dir: PathBuf,
    cookie_name: String,
}

impl SiteLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let cookie_name = cookie_name_for(&base_dir);
        Self {
            base_dir,
            cookie_name,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn root_dir(&self, root: Root) -> PathBuf {
        self.base_dir.join(root.as_str())
    }

    /// The site configuration file, the only editable file outside the roots.
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join(SITE_CONFIG_FILE_NAME)
    }

    pub fn admin_config_file(&self) -> PathBuf {
        self.base_dir.join(ADMIN_CONFIG_FILE_NAME)
    }

    /// Private working directory holding session markers, flash files and
    /// the generator's render cache.
    pub fn work_dir(&self) -> PathBuf {
        self.base_dir.join(WORK_DIR_NAME)
    }

    pub fn audit_log(&self) -> PathBuf {
        self.work_dir().join(AUDIT_LOG_FILE_NAME)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(OUTPUT_DIR_NAME)
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Path relative to the base directory, for messages shown to the operator.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

fn cookie_name_for(base_dir: &Path) -> String {
    let word_chars: String = base_dir
        .to_string_lossy()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    format!("{}{}", COOKIE_PREFIX, word_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_round_trips_through_str() {
        for root in Root::ALL {
            assert_eq!(root.as_str().parse::<Root>().unwrap(), root);
        }
        assert!("htdocs".parse::<Root>().is_err());
        assert!("Content".parse::<Root>().is_err());
    }

    #[test]
    fn test_cookie_name_is_deterministic_and_word_only() {
        let a = SiteLayout::new("/srv/my-site.example");
        let b = SiteLayout::new("/srv/my-site.example");
        assert_eq!(a.cookie_name(), b.cookie_name());
        assert_eq!(a.cookie_name(), "siteadmin_srvmysiteexample");

        let other = SiteLayout::new("/srv/other");
        assert_ne!(a.cookie_name(), other.cookie_name());
    }

    #[test]
    fn test_paths_hang_off_base_dir() {
        let layout = SiteLayout::new("/srv/site");
        assert_eq!(layout.root_dir(Root::Static), PathBuf::from("/srv/site/static"));
        assert_eq!(
            layout.config_file(),
            PathBuf::from("/srv/site/wmk_config.yaml")
        );
        assert_eq!(layout.audit_log(), PathBuf::from("/srv/site/tmp/admin.log"));
        assert_eq!(layout.output_dir(), PathBuf::from("/srv/site/htdocs"));
        assert_eq!(
            layout.display_path(Path::new("/srv/site/content/posts")),
            "content/posts"
        );
    }
}
