use std::sync::Arc;

use common::prelude::*;

use super::config::Config;

/// Main service state, shared by every handler
#[derive(Clone)]
pub struct State {
    inner: Arc<Inner>,
}

struct Inner {
    layout: SiteLayout,
    config: Arc<AdminConfig>,
    sessions: SessionStore,
    content: ContentRepository,
    builds: BuildHandle,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let layout = SiteLayout::new(config.base_dir.clone());
        if !layout.base_dir().is_dir() {
            return Err(StateSetupError::MissingBaseDir(
                layout.base_dir().display().to_string(),
            ));
        }
        let admin_config = AdminConfig::load(&layout)?;
        if admin_config.admin_password.as_deref().unwrap_or_default().is_empty() {
            tracing::warn!("admin_password is not set; nobody will be able to log in");
        }

        let work_dir = layout.work_dir();
        tokio::fs::create_dir_all(&work_dir)
            .await
            .map_err(|e| StateSetupError::WorkDir(work_dir.display().to_string(), e))?;

        Ok(Self::new(layout, admin_config))
    }

    /// Wire up the components and start the build worker.
    pub fn new(layout: SiteLayout, config: AdminConfig) -> Self {
        let config = Arc::new(config);
        let sessions = SessionStore::new(layout.clone());
        let content = ContentRepository::new(layout.clone(), config.clone());
        let builds = BuildCoordinator::spawn(layout.clone(), config.generator.clone());
        tracing::info!(
            base_dir = %layout.base_dir().display(),
            generator = %config.generator.program,
            "service state ready"
        );
        Self {
            inner: Arc::new(Inner {
                layout,
                config,
                sessions,
                content,
                builds,
            }),
        }
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.inner.layout
    }

    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    pub fn content(&self) -> &ContentRepository {
        &self.inner.content
    }

    pub fn builds(&self) -> &BuildHandle {
        &self.inner.builds
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("site base directory does not exist: {0}")]
    MissingBaseDir(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not create work directory {0}: {1}")]
    WorkDir(String, #[source] std::io::Error),
}
