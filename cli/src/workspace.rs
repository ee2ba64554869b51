use std::path::PathBuf;
use std::sync::Arc;

use taskforge_core::api::{AppConfig, ArtifactRepository, CliError, Session, SessionError};
use taskforge_plugins::factory;
use taskforge_plugins::storage::{load_plan, save_plan};

/// Storage directory plus config shared by every command.
pub struct Workspace {
    cfg: AppConfig,
    root: PathBuf,
    repository: Arc<dyn ArtifactRepository>,
}

impl Workspace {
    pub fn new(cfg: AppConfig) -> Self {
        let root = factory::storage_dir(&cfg);
        let repository = factory::build_repository(&cfg);
        Self {
            cfg,
            root,
            repository,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub async fn open_session(&self) -> Result<Session, CliError> {
        let plan = load_plan(&self.root).await?;
        tracing::debug!(
            root = %self.root.display(),
            has_plan = plan.is_some(),
            repository = self.repository.name(),
            "opening session"
        );
        Ok(Session::restore(self.repository.clone(), plan).await?)
    }

    /// Like `open_session`, but a missing plan is an error.
    pub async fn open_planned(&self) -> Result<Session, CliError> {
        let session = self.open_session().await?;
        if session.plan().is_none() {
            return Err(SessionError::NoPlan.into());
        }
        Ok(session)
    }

    pub async fn save(&self, session: &Session) -> Result<(), CliError> {
        if let Some(plan) = session.plan() {
            save_plan(&self.root, plan).await?;
        }
        Ok(())
    }
}
