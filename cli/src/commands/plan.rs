use taskforge_core::api::{CliError, File};
use taskforge_plugins::factory;

use super::cli::PlanArgs;
use crate::workspace::Workspace;

pub async fn plan(ws: &Workspace, args: PlanArgs) -> Result<i32, CliError> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let content = tokio::fs::read_to_string(path).await?;
        files.push(File::new(path.to_string_lossy(), content));
    }

    let planner = factory::build_planner(ws.cfg())?;
    let mut session = ws.open_session().await?;
    tracing::info!(
        planner = planner.name(),
        files = files.len(),
        "requesting plan"
    );
    let plan = session
        .generate_plan(planner.as_ref(), &args.goal, files)
        .await?;

    println!("Goal: {}", plan.goal);
    if !plan.reasoning.is_empty() {
        println!("Reasoning: {}", plan.reasoning);
    }
    println!("Roles:");
    for role in plan.roles() {
        println!("  - {}: {}", role.title, role.purpose);
    }
    println!("Tasks:");
    for task in plan.tasks() {
        if task.deps.is_empty() {
            println!("  - {} [{}] {}", task.id, task.role_title, task.description);
        } else {
            println!(
                "  - {} [{}] {} (after {})",
                task.id,
                task.role_title,
                task.description,
                task.deps.join(", ")
            );
        }
    }

    ws.save(&session).await?;
    Ok(0)
}
