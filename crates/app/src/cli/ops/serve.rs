use std::path::PathBuf;

use clap::Args;

use site_admin::{spawn_service, ServiceConfig};

/// Run the admin server until interrupted
#[derive(Args, Debug, Clone)]
pub struct Serve {
    /// Override the listen host from wmk_admin.yaml
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port from wmk_admin.yaml
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Default log level; RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("server failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let base_dir = ctx
            .base_dir
            .canonicalize()
            .map_err(|e| ServeError::Failed(format!("{}: {}", ctx.base_dir.display(), e)))?;

        let config = ServiceConfig {
            base_dir,
            host: self.host.clone(),
            port: self.port,
            log_level: self.log_level,
            log_dir: self.log_dir.clone(),
        };

        spawn_service(&config).await;
        Ok("server stopped".to_string())
    }
}
