use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::layout::SiteLayout;

/// Metadata fields that can be managed automatically on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    Date,
    CreatedDate,
    ModifiedDate,
}

impl MetadataField {
    pub fn key(&self) -> &'static str {
        match self {
            MetadataField::Date => "date",
            MetadataField::CreatedDate => "created_date",
            MetadataField::ModifiedDate => "modified_date",
        }
    }
}

/// An external command, either a shell string or an argv list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Shell(String),
    Argv(Vec<String>),
}

impl CommandSpec {
    pub fn to_argv(&self) -> Vec<String> {
        match self {
            CommandSpec::Shell(line) => vec!["sh".to_string(), "-c".to_string(), line.clone()],
            CommandSpec::Argv(argv) => argv.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CommandSpec::Shell(line) => line.trim().is_empty(),
            CommandSpec::Argv(argv) => argv.is_empty(),
        }
    }
}

/// How to invoke the site generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Extra arguments appended for quick rebuilds
    #[serde(default = "default_quick_args")]
    pub quick_args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Files in the work dir starting with this prefix are purged by hard rebuilds
    #[serde(default = "default_render_cache_prefix")]
    pub render_cache_prefix: String,
}

fn default_program() -> String {
    "wmk".to_string()
}

fn default_args() -> Vec<String> {
    vec!["b".to_string(), ".".to_string()]
}

fn default_quick_args() -> Vec<String> {
    vec!["--quick".to_string()]
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_render_cache_prefix() -> String {
    "wmk_render_cache".to_string()
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            quick_args: default_quick_args(),
            timeout_secs: default_timeout_secs(),
            render_cache_prefix: default_render_cache_prefix(),
        }
    }
}

/// Contents of `wmk_admin.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// SHA-256 hex digest (preferred) or plaintext
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default)]
    pub deploy: Option<CommandSpec>,
    /// File extension -> metadata fields maintained on save
    #[serde(default)]
    pub auto_metadata: BTreeMap<String, Vec<MetadataField>>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub preview_css: Option<String>,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    7077
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            admin_password: None,
            deploy: None,
            auto_metadata: BTreeMap::new(),
            host: default_host(),
            port: default_port(),
            preview_css: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl AdminConfig {
    /// Load `wmk_admin.yaml` from the site's base directory.
    ///
    /// A missing file is not an error: defaults are used and a warning logged,
    /// so the login page can still explain what is missing.
    pub fn load(layout: &SiteLayout) -> Result<Self, ConfigError> {
        let path = layout.admin_config_file();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "admin config not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Metadata fields registered for the extension of `file_name`, if any.
    pub fn metadata_fields_for(&self, file_name: &str) -> &[MetadataField] {
        let ext = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
            _ => return &[],
        };
        self.auto_metadata
            .get(&ext)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The configured deploy command, ignoring blank entries.
    pub fn deploy_command(&self) -> Option<&CommandSpec> {
        self.deploy.as_ref().filter(|cmd| !cmd.is_empty())
    }
}

/// Human-readable site title from the site configuration file, if one is set.
pub fn site_title(layout: &SiteLayout) -> Option<String> {
    let raw = fs::read_to_string(layout.config_file()).ok()?;
    let value: serde_yaml::Value = serde_yaml::from_str(&raw).ok()?;
    let site = value.get("site")?;
    ["name", "title", "site_name", "site_title"]
        .iter()
        .filter_map(|key| site.get(*key).and_then(|v| v.as_str()))
        .find(|title| !title.is_empty())
        .map(str::to_string)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ConfigurationError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = AdminConfig::from_yaml("").unwrap();
        assert_eq!(config, AdminConfig::default());
        assert_eq!(config.port, 7077);
        assert_eq!(config.generator.program, "wmk");
    }

    #[test]
    fn test_parse_full_config() {
        let raw = r#"
admin_password: 5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8
deploy: "rsync -a htdocs/ host:/var/www/"
port: 8000
auto_metadata:
  md: [created_date, modified_date]
  html:
    - date
generator:
  program: site-gen
  args: ["build"]
  timeout_secs: 5
"#;
        let config = AdminConfig::from_yaml(raw).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "localhost");
        assert_eq!(
            config.deploy_command().unwrap().to_argv(),
            vec!["sh", "-c", "rsync -a htdocs/ host:/var/www/"]
        );
        assert_eq!(
            config.metadata_fields_for("posts/hello.MD"),
            &[MetadataField::CreatedDate, MetadataField::ModifiedDate]
        );
        assert_eq!(config.metadata_fields_for("page.html"), &[MetadataField::Date]);
        assert!(config.metadata_fields_for("notes.txt").is_empty());
        assert!(config.metadata_fields_for("md").is_empty());
        assert_eq!(config.generator.program, "site-gen");
        assert_eq!(config.generator.quick_args, vec!["--quick"]);
        assert_eq!(config.generator.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_blank_deploy_is_ignored() {
        let config = AdminConfig::from_yaml("deploy: '  '").unwrap();
        assert!(config.deploy_command().is_none());
    }

    #[test]
    fn test_site_title_lookup_order() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SiteLayout::new(dir.path());
        assert_eq!(site_title(&layout), None);

        fs::write(
            layout.config_file(),
            "site:\n  title: My Blog\n  site_name: Ignored\n",
        )
        .unwrap();
        assert_eq!(site_title(&layout).as_deref(), Some("My Blog"));
    }
}
