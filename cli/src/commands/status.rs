use taskforge_core::api::{validate_plan, CliError, Plan, SessionError, TaskStatus};

use super::cli::StatusArgs;
use crate::workspace::Workspace;

pub async fn status(ws: &Workspace, args: StatusArgs) -> Result<i32, CliError> {
    let session = ws.open_planned().await?;
    let Some(plan) = session.plan() else {
        return Err(SessionError::NoPlan.into());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(0);
    }
    print!("{}", render_status(plan, session.artifacts().len()));
    Ok(0)
}

pub async fn validate(ws: &Workspace) -> Result<i32, CliError> {
    let session = ws.open_planned().await?;
    let Some(plan) = session.plan() else {
        return Err(SessionError::NoPlan.into());
    };
    validate_plan(plan).map_err(SessionError::from)?;
    println!("plan is valid ({} tasks)", plan.tasks().len());
    Ok(0)
}

fn status_marker(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "[ ]",
        TaskStatus::Running => "[~]",
        TaskStatus::Completed => "[x]",
        TaskStatus::Failed => "[!]",
    }
}

pub(crate) fn render_status(plan: &Plan, artifact_count: usize) -> String {
    let progress = plan.progress();
    let mut out = format!(
        "Goal: {}\nProgress: {}/{} completed ({}%), {} failed, {} artifacts\n",
        plan.goal,
        progress.completed,
        progress.total,
        progress.percent,
        progress.failed,
        artifact_count
    );
    if let Some(notes) = plan.team_notes() {
        out.push_str(&format!("Team notes: {notes}\n"));
    }
    for task in plan.tasks() {
        out.push_str(&format!(
            "{} {} ({}) {}\n",
            status_marker(task.status()),
            task.id,
            task.role_title,
            task.description
        ));
        if !task.deps.is_empty() {
            out.push_str(&format!("      deps: {}\n", task.deps.join(", ")));
        }
        if let Some(err) = task.error() {
            out.push_str(&format!("      error: {err}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_core::api::{Role, Task};

    #[test]
    fn test_render_status() {
        let plan = Plan::new(
            "ship it",
            "",
            vec![Role::new("dev", "code")],
            vec![
                Task::new("a", "first", "dev"),
                Task::new("b", "second", "dev").with_deps(["a"]),
            ],
        );
        let text = render_status(&plan, 0);
        assert!(text.starts_with("Goal: ship it\nProgress: 0/2 completed (0%)"));
        assert!(text.contains("[ ] a (dev) first\n"));
        assert!(text.contains("[ ] b (dev) second\n      deps: a\n"));
    }
}
