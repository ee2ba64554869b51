use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use taskforge_core::api::{Artifact, ArtifactRepository};

/// Stores one JSON file per artifact under `<root>/artifacts/`.
pub struct JsonDirArtifactRepository {
    dir: PathBuf,
}

impl JsonDirArtifactRepository {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join("artifacts"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, artifact: &Artifact) -> PathBuf {
        // Zero-padded timestamp keeps directory listings in creation order.
        self.dir
            .join(format!("{:016}-{}.json", artifact.created_at, artifact.id))
    }
}

#[async_trait]
impl ArtifactRepository for JsonDirArtifactRepository {
    fn name(&self) -> &str {
        "json-dir"
    }

    async fn save_artifact(&self, artifact: &Artifact) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let path = self.file_for(artifact);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(artifact)?;
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("failed to move artifact into {}", path.display()))?;

        tracing::debug!(
            target: "taskforge.storage",
            artifact_id = %artifact.id,
            path = %path.display(),
            "artifact saved"
        );
        Ok(())
    }

    async fn get_all_artifacts(&self) -> anyhow::Result<Vec<Artifact>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.dir.display()))
            }
        };

        let mut artifacts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            match serde_json::from_slice::<Artifact>(&raw) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => tracing::warn!(
                    target: "taskforge.storage",
                    path = %path.display(),
                    error = %e,
                    "skipping unreadable artifact file"
                ),
            }
        }

        artifacts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(artifacts)
    }

    async fn clear_artifacts(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to clear {}", self.dir.display())),
        }
    }
}
