use taskforge_core::api::{ArtifactStore, CliError, ViewMode};
use taskforge_plugins::export::write_export;

use super::cli::{ArtifactsArgs, ExportArgs};
use crate::workspace::Workspace;

pub async fn artifacts(ws: &Workspace, args: ArtifactsArgs) -> Result<i32, CliError> {
    let session = ws.open_session().await?;
    let store = session.artifacts();
    if store.is_empty() {
        println!("no artifacts yet");
        return Ok(0);
    }
    print!("{}", render_view(store, args.view));
    Ok(0)
}

pub async fn export(ws: &Workspace, args: ExportArgs) -> Result<i32, CliError> {
    let session = ws.open_session().await?;
    let entries = session.artifacts().export(args.view);
    let report = write_export(&args.out, &entries).await?;
    println!(
        "exported {} file(s) to {} ({} view)",
        report.written.len(),
        args.out.display(),
        args.view
    );
    for path in &report.skipped {
        eprintln!("skipped unsafe path: {path}");
    }
    Ok(0)
}

fn render_view(store: &ArtifactStore, view: ViewMode) -> String {
    match view {
        ViewMode::Combined => store.combined_view().render(),
        ViewMode::Grouped => {
            let mut out = String::new();
            for group in store.grouped_view() {
                out.push_str(&group.label);
                out.push('\n');
                for line in group.tree.render().lines() {
                    out.push_str("  ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out
        }
    }
}
