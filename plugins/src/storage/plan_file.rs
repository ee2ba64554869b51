use std::path::{Path, PathBuf};

use anyhow::Context;

use taskforge_core::api::Plan;

pub const PLAN_FILE_NAME: &str = "plan.json";

pub fn plan_path(root: &Path) -> PathBuf {
    root.join(PLAN_FILE_NAME)
}

/// Loads the saved plan, or `None` if nothing has been planned yet.
pub async fn load_plan(root: &Path) -> anyhow::Result<Option<Plan>> {
    let path = plan_path(root);
    let raw = match tokio::fs::read(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };
    let plan = serde_json::from_slice::<Plan>(&raw)
        .with_context(|| format!("invalid plan file {}", path.display()))?;
    Ok(Some(plan))
}

pub async fn save_plan(root: &Path, plan: &Plan) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(root)
        .await
        .with_context(|| format!("failed to create {}", root.display()))?;
    let path = plan_path(root);
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(plan)?)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, &path)
        .await
        .with_context(|| format!("failed to replace {}", path.display()))?;
    tracing::debug!(target: "taskforge.storage", path = %path.display(), "plan saved");
    Ok(())
}
