use clap::Args;

use common::prelude::{AdminConfig, BuildCoordinator, BuildError, BuildMode, ConfigError};

/// Regenerate the site once, the same way the admin server does
#[derive(Args, Debug, Clone)]
pub struct Build {
    /// Purge the render cache and the output tree first
    #[arg(long)]
    pub hard: bool,

    /// Recorded in the audit log; builds without a reason are not logged
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildOpError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("{0}")]
    Unsuccessful(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Build {
    type Error = BuildOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let layout = ctx.layout();
        let config = AdminConfig::load(&layout)?;
        let mode = if self.hard {
            BuildMode::Hard
        } else {
            BuildMode::Normal
        };

        let handle = BuildCoordinator::spawn(layout, config.generator);
        let report = handle.rebuild(self.reason.clone(), mode).await?;

        let mut output = format!("{} build: {}", report.mode, report.outcome);
        for line in &report.diagnostics {
            output.push('\n');
            output.push_str(line);
        }
        if report.outcome.is_success() {
            Ok(output)
        } else {
            Err(BuildOpError::Unsuccessful(output))
        }
    }
}
