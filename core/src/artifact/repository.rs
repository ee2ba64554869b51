use async_trait::async_trait;
use tokio::sync::RwLock;

use super::model::Artifact;

/// Durable artifact storage behind the in-memory store.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    fn name(&self) -> &str;
    async fn save_artifact(&self, artifact: &Artifact) -> anyhow::Result<()>;
    /// All persisted artifacts in creation order.
    async fn get_all_artifacts(&self) -> anyhow::Result<Vec<Artifact>>;
    async fn clear_artifacts(&self) -> anyhow::Result<()>;
}

/// Repository that forgets everything when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryArtifactRepository {
    artifacts: RwLock<Vec<Artifact>>,
}

impl InMemoryArtifactRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactRepository for InMemoryArtifactRepository {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save_artifact(&self, artifact: &Artifact) -> anyhow::Result<()> {
        self.artifacts.write().await.push(artifact.clone());
        Ok(())
    }

    async fn get_all_artifacts(&self) -> anyhow::Result<Vec<Artifact>> {
        let mut all = self.artifacts.read().await.clone();
        all.sort_by_key(|a| a.created_at);
        Ok(all)
    }

    async fn clear_artifacts(&self) -> anyhow::Result<()> {
        self.artifacts.write().await.clear();
        Ok(())
    }
}
