//! One working session: the live plan, its artifact history, the plan-level
//! execution state and the in-flight marker.

use std::sync::Arc;

use chrono::Utc;

use crate::artifact::{Artifact, ArtifactRepository, ArtifactStore, File, INITIAL_CONTEXT_TASK_ID};
use crate::error::{ArtifactError, PlanError, PlanningError, SessionError};
use crate::executor::Planner;
use crate::plan::{Plan, Role, Task, TaskEdit};
use crate::state::{ExecutionState, StateTransition, TransitionError};

pub struct Session {
    plan: Option<Plan>,
    artifacts: ArtifactStore,
    repository: Arc<dyn ArtifactRepository>,
    state: ExecutionState,
    in_flight: Option<String>,
}

impl Session {
    pub fn new(repository: Arc<dyn ArtifactRepository>) -> Self {
        Self {
            plan: None,
            artifacts: ArtifactStore::new(),
            repository,
            state: ExecutionState::Idle,
            in_flight: None,
        }
    }

    /// Rebuilds a session from persisted artifacts and an optional saved plan.
    /// Tasks the saved plan still shows as `running` go back to `pending`.
    pub async fn restore(
        repository: Arc<dyn ArtifactRepository>,
        plan: Option<Plan>,
    ) -> Result<Self, SessionError> {
        let history = repository
            .get_all_artifacts()
            .await
            .map_err(ArtifactError::from)?;
        let artifacts = ArtifactStore::from_history(history);

        let plan = plan.map(|mut plan| {
            let recovered = plan.recover_interrupted();
            if !recovered.is_empty() {
                tracing::warn!(
                    target: "taskforge.session",
                    tasks = ?recovered,
                    "reset interrupted tasks to pending"
                );
            }
            plan
        });

        tracing::debug!(
            target: "taskforge.session",
            repository = repository.name(),
            artifacts = artifacts.len(),
            has_plan = plan.is_some(),
            "session restored"
        );

        Ok(Self {
            plan,
            artifacts,
            repository,
            state: ExecutionState::Idle,
            in_flight: None,
        })
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    /// Asks the planner for a new plan and makes it live. On planner failure
    /// the current plan and artifacts are left untouched.
    pub async fn generate_plan(
        &mut self,
        planner: &dyn Planner,
        goal: &str,
        initial_files: Vec<File>,
    ) -> Result<&Plan, SessionError> {
        self.ensure_not_running()?;
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(PlanningError::EmptyGoal.into());
        }

        tracing::info!(
            target: "taskforge.session",
            planner = planner.name(),
            files = initial_files.len(),
            "generating plan"
        );
        let plan = planner.plan(goal, &initial_files).await?;
        self.replace_plan(plan).await?;

        if !initial_files.is_empty() {
            self.record_artifact(INITIAL_CONTEXT_TASK_ID, initial_files)
                .await?;
        }

        self.plan.as_ref().ok_or(SessionError::NoPlan)
    }

    /// Makes `plan` live, clearing the artifact history first. Runtime task
    /// fields are reset and the execution state goes back to `idle`.
    pub async fn replace_plan(&mut self, mut plan: Plan) -> Result<(), SessionError> {
        self.ensure_not_running()?;
        self.repository
            .clear_artifacts()
            .await
            .map_err(ArtifactError::from)?;
        self.artifacts.clear();

        plan.reset_runtime();
        tracing::info!(
            target: "taskforge.session",
            tasks = plan.tasks().len(),
            roles = plan.roles().len(),
            "plan replaced"
        );
        self.plan = Some(plan);
        self.state = ExecutionState::Idle;
        self.in_flight = None;
        Ok(())
    }

    pub fn add_task(&mut self, task: Task) -> Result<(), PlanError> {
        self.edit(|plan| plan.add_task(task))
    }

    pub fn delete_task(&mut self, task_id: &str) -> Result<Task, PlanError> {
        self.edit(|plan| plan.delete_task(task_id))
    }

    pub fn edit_task(&mut self, task_id: &str, edit: TaskEdit) -> Result<(), PlanError> {
        self.edit(|plan| plan.edit_task(task_id, edit))
    }

    pub fn add_role(&mut self, role: Role) -> Result<(), PlanError> {
        self.edit(|plan| plan.add_role(role))
    }

    pub fn toggle_dependency(&mut self, task_id: &str, dep_id: &str) -> Result<bool, PlanError> {
        self.edit(|plan| plan.toggle_dependency(task_id, dep_id))
    }

    /// Applies a structural edit. A successful edit to a finished or failed
    /// session reopens it as `idle` so the changed plan can be started again.
    fn edit<T>(
        &mut self,
        apply: impl FnOnce(&mut Plan) -> Result<T, PlanError>,
    ) -> Result<T, PlanError> {
        self.ensure_not_running()?;
        let plan = self.plan.as_mut().ok_or(PlanError::NoPlan)?;
        let out = apply(plan)?;
        if StateTransition::is_terminal(self.state) {
            tracing::info!(
                target: "taskforge.session",
                from = %self.state,
                "plan edited after execution ended; session reopened"
            );
            self.state = ExecutionState::Idle;
        }
        Ok(out)
    }

    fn ensure_not_running(&self) -> Result<(), PlanError> {
        if self.state == ExecutionState::Running {
            return Err(PlanError::EditWhileRunning);
        }
        Ok(())
    }

    pub(crate) fn plan_mut(&mut self) -> Result<&mut Plan, SessionError> {
        self.plan.as_mut().ok_or(SessionError::NoPlan)
    }

    /// Moves the execution state; returns the previous state.
    pub(crate) fn transition(
        &mut self,
        to: ExecutionState,
    ) -> Result<ExecutionState, TransitionError> {
        StateTransition::validate(self.state, to)?;
        Ok(std::mem::replace(&mut self.state, to))
    }

    pub(crate) fn set_in_flight(&mut self, task_id: Option<String>) {
        self.in_flight = task_id;
    }

    /// Persists a new artifact, then appends it to the in-memory history.
    pub(crate) async fn record_artifact(
        &mut self,
        task_id: &str,
        files: Vec<File>,
    ) -> Result<String, ArtifactError> {
        let created_at = self
            .artifacts
            .next_timestamp(Utc::now().timestamp_millis());
        let artifact = Artifact::new(task_id, files, created_at);
        self.repository.save_artifact(&artifact).await?;

        let artifact_id = artifact.id.clone();
        self.artifacts.record(artifact)?;
        Ok(artifact_id)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("in_flight", &self.in_flight)
            .field("tasks", &self.plan.as_ref().map(|p| p.tasks().len()))
            .field("artifacts", &self.artifacts.len())
            .field("repository", &self.repository.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::InMemoryArtifactRepository;
    use pretty_assertions::assert_eq;

    fn plan() -> Plan {
        Plan::new(
            "goal",
            "",
            vec![Role::new("dev", "code")],
            vec![Task::new("a", "first", "dev")],
        )
    }

    #[tokio::test]
    async fn test_edits_rejected_while_running() {
        let mut session = Session::new(Arc::new(InMemoryArtifactRepository::new()));
        assert_eq!(
            session.add_role(Role::new("qa", "test")),
            Err(PlanError::NoPlan)
        );

        session.replace_plan(plan()).await.unwrap();
        session.transition(ExecutionState::Running).unwrap();
        assert_eq!(
            session.add_task(Task::new("b", "second", "dev")),
            Err(PlanError::EditWhileRunning)
        );
        assert!(session.replace_plan(plan()).await.is_err());

        session.transition(ExecutionState::Paused).unwrap();
        session.add_task(Task::new("b", "second", "dev")).unwrap();
        assert_eq!(session.plan().unwrap().tasks().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_after_finish_reopens_session() {
        let mut session = Session::new(Arc::new(InMemoryArtifactRepository::new()));
        session.replace_plan(plan()).await.unwrap();
        session.transition(ExecutionState::Running).unwrap();
        session.transition(ExecutionState::Finished).unwrap();

        assert_eq!(
            session.add_task(Task::new("a", "dup", "dev")),
            Err(PlanError::DuplicateTaskId("a".into()))
        );
        assert_eq!(session.state(), ExecutionState::Finished);

        session.add_task(Task::new("b", "second", "dev")).unwrap();
        assert_eq!(session.state(), ExecutionState::Idle);
        session.transition(ExecutionState::Running).unwrap();
    }

    #[tokio::test]
    async fn test_record_artifact_persists_first() {
        let repo = Arc::new(InMemoryArtifactRepository::new());
        let mut session = Session::new(repo.clone());
        session.replace_plan(plan()).await.unwrap();

        let id = session
            .record_artifact("a", vec![File::new("x.txt", "1")])
            .await
            .unwrap();
        let id2 = session
            .record_artifact("a", vec![File::new("x.txt", "2")])
            .await
            .unwrap();

        let persisted = repo.get_all_artifacts().await.unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[0].id, id);
        assert!(session.artifacts().get(&id2).unwrap().created_at > persisted[0].created_at);
    }

    #[tokio::test]
    async fn test_restore_recovers_running_tasks() {
        let repo = Arc::new(InMemoryArtifactRepository::new());
        repo.save_artifact(&Artifact::new("a", vec![File::new("x", "y")], 5))
            .await
            .unwrap();

        let mut saved = plan();
        saved.mark_running("a").unwrap();
        let session = Session::restore(repo, Some(saved)).await.unwrap();

        assert_eq!(session.state(), ExecutionState::Idle);
        assert_eq!(session.artifacts().len(), 1);
        assert_eq!(
            session.plan().unwrap().task("a").unwrap().status(),
            crate::plan::TaskStatus::Pending
        );
    }
}
