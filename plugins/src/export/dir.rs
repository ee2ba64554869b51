use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context};

use taskforge_core::api::ExportEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<String>,
}

/// Resolves `relative` below `root`, refusing absolute paths and `..` segments.
fn resolve(root: &Path, relative: &str) -> Option<PathBuf> {
    let rel = Path::new(relative);
    let mut out = root.to_path_buf();
    let mut depth = 0usize;
    for comp in rel.components() {
        match comp {
            Component::Normal(seg) => {
                out.push(seg);
                depth += 1;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    (depth > 0).then_some(out)
}

/// Whether writing a file at `target` would collide with what is already on
/// disk: `target` is a directory, or one of its parents below `root` is a file.
async fn collides(root: &Path, target: &Path) -> bool {
    if let Ok(meta) = tokio::fs::metadata(target).await {
        if meta.is_dir() {
            return true;
        }
    }
    for parent in target.ancestors().skip(1) {
        if parent == root {
            break;
        }
        if let Ok(meta) = tokio::fs::metadata(parent).await {
            if !meta.is_dir() {
                return true;
            }
        }
    }
    false
}

/// Writes every entry below `out_dir`. Entries that would escape the
/// directory, or that collide with a file or directory written earlier, are
/// skipped and reported instead of failing the whole export.
pub async fn write_export(out_dir: &Path, entries: &[ExportEntry]) -> anyhow::Result<ExportReport> {
    if tokio::fs::metadata(out_dir)
        .await
        .map(|m| !m.is_dir())
        .unwrap_or(false)
    {
        bail!("export target {} is not a directory", out_dir.display());
    }
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut report = ExportReport::default();
    for entry in entries {
        let Some(target) = resolve(out_dir, &entry.path) else {
            tracing::warn!(
                target: "taskforge.export",
                path = %entry.path,
                "refusing to export path outside the target directory"
            );
            report.skipped.push(entry.path.clone());
            continue;
        };
        if collides(out_dir, &target).await {
            tracing::warn!(
                target: "taskforge.export",
                path = %entry.path,
                "skipping path that collides with an existing file or directory"
            );
            report.skipped.push(entry.path.clone());
            continue;
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&target, entry.content.as_bytes())
            .await
            .with_context(|| format!("failed to write {}", target.display()))?;
        report.written.push(target);
    }

    tracing::info!(
        target: "taskforge.export",
        dir = %out_dir.display(),
        written = report.written.len(),
        skipped = report.skipped.len(),
        "export finished"
    );
    Ok(report)
}
