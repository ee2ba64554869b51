use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Lifecycle of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// `completed` and `failed` never transition again automatically.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn can_transition_to(self, to: TaskStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub title: String,
    pub purpose: String,
}

impl Role {
    pub fn new(title: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            purpose: purpose.into(),
        }
    }
}

/// One unit of work. Runtime fields (`status`, `output`, `artifact_id`,
/// `error`) are only written by the scheduler through [`Plan`]'s
/// crate-private transition methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub description: String,
    #[serde(rename = "role")]
    pub role_title: String,
    #[serde(rename = "agent", default, skip_serializing_if = "Option::is_none")]
    pub agent_hint: Option<String>,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub(crate) status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) output: Option<String>,
    #[serde(rename = "artifactId", default, skip_serializing_if = "Option::is_none")]
    pub(crate) artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        role_title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            role_title: role_title.into(),
            agent_hint: None,
            deps: Vec::new(),
            status: TaskStatus::Pending,
            output: None,
            artifact_id: None,
            error: None,
        }
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = dedup_deps(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent_hint = Some(agent.into());
        self
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn artifact_id(&self) -> Option<&str> {
        self.artifact_id.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn depends_on(&self, task_id: &str) -> bool {
        self.deps.iter().any(|d| d == task_id)
    }

    fn reset_runtime(&mut self) {
        self.status = TaskStatus::Pending;
        self.output = None;
        self.artifact_id = None;
        self.error = None;
    }
}

/// Keeps first-seen order; `deps` behaves as a set.
pub(crate) fn dedup_deps<I>(deps: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for dep in deps {
        let dep = dep.trim().to_string();
        if !dep.is_empty() && !out.contains(&dep) {
            out.push(dep);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub agent: String,
    pub role: String,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompts: Vec<Prompt>,
}

/// Completion summary of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlanProgress {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "high_level_goal", alias = "goal")]
    pub goal: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub(crate) roles: Vec<Role>,
    #[serde(default)]
    pub(crate) tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) team: Option<Team>,
}

impl Plan {
    /// Builds a fresh plan. Every task starts `pending` regardless of what the
    /// caller passed in.
    pub fn new(
        goal: impl Into<String>,
        reasoning: impl Into<String>,
        roles: Vec<Role>,
        tasks: Vec<Task>,
    ) -> Self {
        let mut plan = Self {
            goal: goal.into(),
            reasoning: reasoning.into(),
            roles,
            tasks,
            team: None,
        };
        plan.reset_runtime();
        plan
    }

    pub fn with_team(mut self, team: Team) -> Self {
        self.team = Some(team);
        self
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn team(&self) -> Option<&Team> {
        self.team.as_ref()
    }

    pub fn team_notes(&self) -> Option<&str> {
        self.team.as_ref().and_then(|t| t.notes.as_deref())
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn role(&self, title: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.title == title)
    }

    pub fn all_completed(&self) -> bool {
        self.tasks.iter().all(|t| t.status == TaskStatus::Completed)
    }

    pub fn any_failed(&self) -> bool {
        self.tasks.iter().any(|t| t.status == TaskStatus::Failed)
    }

    pub fn running_task(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| t.status == TaskStatus::Running)
    }

    pub fn task_ids_with_status(&self, status: TaskStatus) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.status == status)
            .map(|t| t.id.clone())
            .collect()
    }

    pub fn progress(&self) -> PlanProgress {
        let mut progress = PlanProgress {
            total: self.tasks.len(),
            ..PlanProgress::default()
        };
        for task in &self.tasks {
            match task.status {
                TaskStatus::Pending => progress.pending += 1,
                TaskStatus::Running => progress.running += 1,
                TaskStatus::Completed => progress.completed += 1,
                TaskStatus::Failed => progress.failed += 1,
            }
        }
        if progress.total > 0 {
            let pct = (progress.completed as f64 * 100.0 / progress.total as f64).round();
            progress.percent = pct as u8;
        }
        progress
    }

    /// A plan loaded from disk may still show a task as `running` if the
    /// process died mid-step. That dispatch is lost, so the task goes back to
    /// `pending`.
    pub fn recover_interrupted(&mut self) -> Vec<String> {
        let mut recovered = Vec::new();
        for task in self.tasks.iter_mut() {
            if task.status == TaskStatus::Running {
                task.reset_runtime();
                recovered.push(task.id.clone());
            }
        }
        recovered
    }

    pub(crate) fn reset_runtime(&mut self) {
        for task in self.tasks.iter_mut() {
            task.reset_runtime();
        }
    }

    pub(crate) fn mark_running(&mut self, task_id: &str) -> Result<(), PlanError> {
        let task = self.transition(task_id, TaskStatus::Running)?;
        task.error = None;
        Ok(())
    }

    pub(crate) fn mark_completed(
        &mut self,
        task_id: &str,
        output: String,
        artifact_id: Option<String>,
    ) -> Result<(), PlanError> {
        let task = self.transition(task_id, TaskStatus::Completed)?;
        task.output = Some(output);
        task.artifact_id = artifact_id;
        Ok(())
    }

    pub(crate) fn mark_failed(&mut self, task_id: &str, error: String) -> Result<(), PlanError> {
        let task = self.transition(task_id, TaskStatus::Failed)?;
        task.error = Some(error);
        Ok(())
    }

    /// Folds team metadata reported by an executor into the plan. Non-empty
    /// notes replace the current notes; prompts are appended.
    pub(crate) fn merge_team(&mut self, update: Team) {
        let team = self.team.get_or_insert_with(Team::default);
        if let Some(notes) = update.notes.filter(|n| !n.trim().is_empty()) {
            team.notes = Some(notes);
        }
        team.prompts.extend(update.prompts);
    }

    fn transition(&mut self, task_id: &str, to: TaskStatus) -> Result<&mut Task, PlanError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| PlanError::TaskNotFound(task_id.to_string()))?;
        if !task.status.can_transition_to(to) {
            return Err(PlanError::InvalidStatusTransition {
                task_id: task_id.to_string(),
                from: task.status,
                to,
            });
        }
        task.status = to;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_plan() -> Plan {
        Plan::new(
            "ship it",
            "because",
            vec![Role::new("dev", "writes code")],
            vec![
                Task::new("a", "first", "dev"),
                Task::new("b", "second", "dev").with_deps(["a"]),
            ],
        )
    }

    #[test]
    fn test_new_plan_resets_runtime_fields() {
        let mut task = Task::new("a", "first", "dev");
        task.status = TaskStatus::Completed;
        task.output = Some("stale".into());
        let plan = Plan::new("g", "r", vec![], vec![task]);
        assert_eq!(plan.tasks()[0].status(), TaskStatus::Pending);
        assert_eq!(plan.tasks()[0].output(), None);
    }

    #[test]
    fn test_status_transitions_follow_lifecycle() {
        let mut plan = sample_plan();
        assert!(plan.mark_completed("a", "x".into(), None).is_err());
        plan.mark_running("a").unwrap();
        plan.mark_completed("a", "done".into(), Some("art".into())).unwrap();
        assert_eq!(plan.task("a").unwrap().status(), TaskStatus::Completed);
        assert_eq!(plan.task("a").unwrap().artifact_id(), Some("art"));

        let err = plan.mark_running("a").unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidStatusTransition {
                task_id: "a".into(),
                from: TaskStatus::Completed,
                to: TaskStatus::Running,
            }
        );
    }

    #[test]
    fn test_mark_failed_records_error() {
        let mut plan = sample_plan();
        plan.mark_running("a").unwrap();
        plan.mark_failed("a", "boom".into()).unwrap();
        let task = plan.task("a").unwrap();
        assert_eq!(task.status(), TaskStatus::Failed);
        assert_eq!(task.error(), Some("boom"));
        assert!(plan.any_failed());
    }

    #[test]
    fn test_progress_counts_and_percent() {
        let mut plan = sample_plan();
        assert_eq!(plan.progress().percent, 0);
        plan.mark_running("a").unwrap();
        plan.mark_completed("a", "ok".into(), None).unwrap();
        let progress = plan.progress();
        assert_eq!(progress.total, 2);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.pending, 1);
        assert_eq!(progress.percent, 50);

        let empty = Plan::new("g", "r", vec![], vec![]);
        assert_eq!(empty.progress().percent, 0);
    }

    #[test]
    fn test_recover_interrupted_resets_running_tasks() {
        let mut plan = sample_plan();
        plan.mark_running("a").unwrap();
        assert_eq!(plan.recover_interrupted(), vec!["a".to_string()]);
        assert_eq!(plan.task("a").unwrap().status(), TaskStatus::Pending);
    }

    #[test]
    fn test_merge_team_replaces_notes_and_appends_prompts() {
        let mut plan = sample_plan().with_team(Team {
            notes: Some("old".into()),
            prompts: vec![],
        });
        plan.merge_team(Team {
            notes: Some("  ".into()),
            prompts: vec![Prompt {
                agent: "coder".into(),
                role: "dev".into(),
                system_prompt: "be terse".into(),
            }],
        });
        assert_eq!(plan.team_notes(), Some("old"));
        plan.merge_team(Team {
            notes: Some("new".into()),
            prompts: vec![],
        });
        assert_eq!(plan.team_notes(), Some("new"));
        assert_eq!(plan.team().unwrap().prompts.len(), 1);
    }

    #[test]
    fn test_plan_deserializes_planner_shape() {
        let raw = r#"{
            "high_level_goal": "build a site",
            "reasoning": "split by skill",
            "roles": [{"title": "dev", "purpose": "code"}],
            "tasks": [
                {"id": "init", "description": "scaffold", "role": "dev", "deps": []},
                {"id": "page", "description": "page", "role": "dev", "agent": "coder", "deps": ["init"]}
            ],
            "team": {"notes": "small team"}
        }"#;
        let plan: Plan = serde_json::from_str(raw).unwrap();
        assert_eq!(plan.goal, "build a site");
        assert_eq!(plan.tasks()[1].agent_hint.as_deref(), Some("coder"));
        assert_eq!(plan.tasks()[1].status(), TaskStatus::Pending);
        assert_eq!(plan.team_notes(), Some("small team"));
    }

    #[test]
    fn test_with_deps_dedups_and_trims() {
        let task = Task::new("c", "third", "dev").with_deps(["a", " a", "b", ""]);
        assert_eq!(task.deps, vec!["a".to_string(), "b".to_string()]);
    }
}
