//! Structural edits to a live plan.
//!
//! None of these touch task status; status only moves through the
//! scheduler's transition methods on [`Plan`].

use super::model::{dedup_deps, Plan, Role, Task};
use crate::error::PlanError;

/// Field-level edit of an existing task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub description: Option<String>,
    pub role_title: Option<String>,
    /// `Some(None)` clears the agent hint.
    pub agent_hint: Option<Option<String>>,
    pub deps: Option<Vec<String>>,
}

impl TaskEdit {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn role(mut self, role_title: impl Into<String>) -> Self {
        self.role_title = Some(role_title.into());
        self
    }

    pub fn agent(mut self, agent: Option<String>) -> Self {
        self.agent_hint = Some(agent);
        self
    }

    pub fn deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.role_title.is_none()
            && self.agent_hint.is_none()
            && self.deps.is_none()
    }
}

impl Plan {
    /// Appends a task. It always starts `pending`.
    pub fn add_task(&mut self, mut task: Task) -> Result<(), PlanError> {
        task.id = task.id.trim().to_string();
        if task.id.is_empty() {
            return Err(PlanError::MissingField("id"));
        }
        if task.description.trim().is_empty() {
            return Err(PlanError::MissingField("description"));
        }
        if task.role_title.trim().is_empty() {
            return Err(PlanError::MissingField("role"));
        }
        if self.task(&task.id).is_some() {
            return Err(PlanError::DuplicateTaskId(task.id));
        }
        task.deps = dedup_deps(task.deps);
        self.check_role(&task.id, &task.role_title)?;
        self.check_deps(&task.id, &task.deps)?;

        let task = Task::new(task.id, task.description, task.role_title)
            .with_deps(task.deps)
            .with_agent_opt(task.agent_hint);
        tracing::debug!(target: "taskforge.plan", task_id = %task.id, "task added");
        self.tasks.push(task);
        Ok(())
    }

    /// Removes a task. Tasks that depended on it keep the dangling id and can
    /// no longer become ready.
    pub fn delete_task(&mut self, task_id: &str) -> Result<Task, PlanError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| PlanError::TaskNotFound(task_id.to_string()))?;
        let removed = self.tasks.remove(idx);
        let orphaned = self.tasks.iter().filter(|t| t.depends_on(task_id)).count();
        if orphaned > 0 {
            tracing::warn!(
                target: "taskforge.plan",
                task_id = %task_id,
                orphaned,
                "deleted task is still referenced as a dependency"
            );
        }
        Ok(removed)
    }

    pub fn edit_task(&mut self, task_id: &str, edit: TaskEdit) -> Result<(), PlanError> {
        if self.task(task_id).is_none() {
            return Err(PlanError::TaskNotFound(task_id.to_string()));
        }
        if let Some(description) = &edit.description {
            if description.trim().is_empty() {
                return Err(PlanError::MissingField("description"));
            }
        }
        if let Some(role) = &edit.role_title {
            self.check_role(task_id, role)?;
        }
        let deps = edit.deps.map(dedup_deps);
        if let Some(deps) = &deps {
            self.check_deps(task_id, deps)?;
        }

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return Err(PlanError::TaskNotFound(task_id.to_string()));
        };
        if let Some(description) = edit.description {
            task.description = description;
        }
        if let Some(role) = edit.role_title {
            task.role_title = role;
        }
        if let Some(agent) = edit.agent_hint {
            task.agent_hint = agent.filter(|a| !a.trim().is_empty());
        }
        if let Some(deps) = deps {
            task.deps = deps;
        }
        Ok(())
    }

    /// Adds `dep_id` to the task's dependencies, or removes it if present.
    /// Returns whether the dependency is present afterwards.
    pub fn toggle_dependency(&mut self, task_id: &str, dep_id: &str) -> Result<bool, PlanError> {
        if task_id == dep_id {
            return Err(PlanError::SelfDependency(task_id.to_string()));
        }
        let Some(current) = self.task(task_id) else {
            return Err(PlanError::TaskNotFound(task_id.to_string()));
        };
        let mut deps = current.deps.clone();
        let present = if let Some(pos) = deps.iter().position(|d| d == dep_id) {
            deps.remove(pos);
            false
        } else {
            if self.task(dep_id).is_none() {
                return Err(PlanError::UnknownDependency {
                    task_id: task_id.to_string(),
                    dep: dep_id.to_string(),
                });
            }
            deps.push(dep_id.to_string());
            true
        };
        self.edit_task(task_id, TaskEdit::default().deps(deps))?;
        Ok(present)
    }

    pub fn add_role(&mut self, role: Role) -> Result<(), PlanError> {
        let title = role.title.trim();
        if title.is_empty() {
            return Err(PlanError::MissingField("title"));
        }
        if role.purpose.trim().is_empty() {
            return Err(PlanError::MissingField("purpose"));
        }
        if self.role(title).is_some() {
            return Err(PlanError::DuplicateRole(title.to_string()));
        }
        self.roles.push(Role::new(title, role.purpose));
        Ok(())
    }

    fn check_role(&self, task_id: &str, role: &str) -> Result<(), PlanError> {
        if self.role(role).is_none() {
            return Err(PlanError::UnknownRole {
                task_id: task_id.to_string(),
                role: role.to_string(),
            });
        }
        Ok(())
    }

    fn check_deps(&self, task_id: &str, deps: &[String]) -> Result<(), PlanError> {
        for dep in deps {
            if dep == task_id {
                return Err(PlanError::SelfDependency(task_id.to_string()));
            }
            if self.task(dep).is_none() {
                return Err(PlanError::UnknownDependency {
                    task_id: task_id.to_string(),
                    dep: dep.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Task {
    fn with_agent_opt(mut self, agent: Option<String>) -> Self {
        self.agent_hint = agent.filter(|a| !a.trim().is_empty());
        self
    }
}
