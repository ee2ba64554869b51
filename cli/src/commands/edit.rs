use taskforge_core::api::{CliError, Role, Task, TaskEdit};

use super::cli::{RoleCommand, TaskCommand};
use crate::workspace::Workspace;

pub async fn task(ws: &Workspace, cmd: TaskCommand) -> Result<i32, CliError> {
    let mut session = ws.open_planned().await?;
    match cmd {
        TaskCommand::Add {
            id,
            description,
            role,
            agent,
            deps,
        } => {
            let mut task = Task::new(id, description, role).with_deps(deps);
            if let Some(agent) = agent {
                task = task.with_agent(agent);
            }
            let id = task.id.clone();
            session.add_task(task)?;
            println!("added task {id}");
        }
        TaskCommand::Delete { id } => {
            let removed = session.delete_task(&id)?;
            println!("deleted task {}", removed.id);
        }
        TaskCommand::Edit {
            id,
            description,
            role,
            agent,
            clear_agent,
            deps,
            no_deps,
        } => {
            let edit = build_edit(description, role, agent, clear_agent, deps, no_deps);
            if edit.is_empty() {
                return Err(CliError::Command(format!("nothing to change on task {id}")));
            }
            session.edit_task(&id, edit)?;
            println!("updated task {id}");
        }
        TaskCommand::Dep { task, dep } => {
            if session.toggle_dependency(&task, &dep)? {
                println!("{task} now depends on {dep}");
            } else {
                println!("{task} no longer depends on {dep}");
            }
        }
    }
    ws.save(&session).await?;
    Ok(0)
}

pub async fn role(ws: &Workspace, cmd: RoleCommand) -> Result<i32, CliError> {
    let mut session = ws.open_planned().await?;
    match cmd {
        RoleCommand::Add { title, purpose } => {
            session.add_role(Role::new(title.clone(), purpose))?;
            println!("added role {title}");
        }
    }
    ws.save(&session).await?;
    Ok(0)
}

fn build_edit(
    description: Option<String>,
    role: Option<String>,
    agent: Option<String>,
    clear_agent: bool,
    deps: Option<Vec<String>>,
    no_deps: bool,
) -> TaskEdit {
    let mut edit = TaskEdit::default();
    if let Some(description) = description {
        edit = edit.description(description);
    }
    if let Some(role) = role {
        edit = edit.role(role);
    }
    if clear_agent {
        edit = edit.agent(None);
    } else if agent.is_some() {
        edit = edit.agent(agent);
    }
    if no_deps {
        edit = edit.deps(Vec::<String>::new());
    } else if let Some(deps) = deps {
        edit = edit.deps(deps);
    }
    edit
}
