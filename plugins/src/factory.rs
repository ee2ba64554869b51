use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use taskforge_core::api::{AppConfig, ArtifactRepository, Planner, TaskExecutor};

use crate::backend::{AiServiceExecutor, AiServicePlanner};
use crate::storage::JsonDirArtifactRepository;

pub fn build_executor(cfg: &AppConfig) -> Result<Arc<dyn TaskExecutor>> {
    Ok(Arc::new(AiServiceExecutor::new(&cfg.aiservice)?))
}

pub fn build_planner(cfg: &AppConfig) -> Result<Box<dyn Planner>> {
    Ok(Box::new(AiServicePlanner::new(&cfg.aiservice)?))
}

pub fn storage_dir(cfg: &AppConfig) -> PathBuf {
    PathBuf::from(&cfg.storage.directory)
}

pub fn build_repository(cfg: &AppConfig) -> Arc<dyn ArtifactRepository> {
    Arc::new(JsonDirArtifactRepository::new(storage_dir(cfg)))
}
