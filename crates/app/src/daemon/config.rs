use std::path::PathBuf;

/// Process-level settings for the admin service, assembled by the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory of the administered site
    pub base_dir: PathBuf,
    /// Listen host; falls back to `host` in wmk_admin.yaml
    pub host: Option<String>,
    /// Listen port; falls back to `port` in wmk_admin.yaml
    pub port: Option<u16>,
    pub log_level: tracing::Level,
    /// Directory for daily rolling log files
    pub log_dir: Option<PathBuf>,
}
