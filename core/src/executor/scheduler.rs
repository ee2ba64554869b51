use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::broadcast;

use super::graph::{next_ready, transitive_dependencies, validate_plan};
use super::traits::TaskExecutor;
use super::types::{AgentOutput, StepOutcome};
use crate::artifact::Artifact;
use crate::config::{ContextMode, SchedulerConfig};
use crate::error::{ExecutorError, SessionError};
use crate::plan::{Task, TaskStatus};
use crate::session::Session;
use crate::state::{ExecutionState, SchedulerEvent};

/// Cloneable request to pause a running loop. The request is honoured before
/// the next step is dispatched; an in-flight task always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives a [`Session`]'s plan one task at a time.
pub struct Scheduler {
    executor: Arc<dyn TaskExecutor>,
    config: SchedulerConfig,
    events: broadcast::Sender<SchedulerEvent>,
    pause_requests: PauseHandle,
}

impl Scheduler {
    pub fn new(executor: Arc<dyn TaskExecutor>, config: SchedulerConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            executor,
            config,
            events,
            pause_requests: PauseHandle::default(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.events.subscribe()
    }

    pub fn pause_handle(&self) -> PauseHandle {
        self.pause_requests.clone()
    }

    /// `idle -> running`, or `paused -> running` on resume. With
    /// `strict_graph` the plan must pass preflight first.
    pub fn start(&self, session: &mut Session) -> Result<(), SessionError> {
        let plan = session.plan().ok_or(SessionError::NoPlan)?;
        if self.config.strict_graph {
            validate_plan(plan)?;
        }
        self.pause_requests.clear();
        self.transition(session, ExecutionState::Running)?;
        Ok(())
    }

    pub fn resume(&self, session: &mut Session) -> Result<(), SessionError> {
        self.start(session)
    }

    pub fn pause(&self, session: &mut Session) -> Result<(), SessionError> {
        self.transition(session, ExecutionState::Paused)?;
        Ok(())
    }

    /// Runs one iteration: dispatch the first ready task, or settle the plan
    /// state when nothing is ready. Per-task failures are absorbed into the
    /// plan; only setup problems are returned as errors.
    pub async fn step(&self, session: &mut Session) -> Result<StepOutcome, SessionError> {
        if session.state() != ExecutionState::Running {
            return Ok(StepOutcome::NotRunning {
                state: session.state(),
            });
        }
        if let Some(task_id) = session.in_flight() {
            return Ok(StepOutcome::Busy {
                task_id: task_id.to_string(),
            });
        }

        let plan = session.plan().ok_or(SessionError::NoPlan)?;
        let Some(task) = next_ready(plan.tasks()).cloned() else {
            return self.settle(session);
        };

        self.dispatch(session, task).await
    }

    /// Steps until the plan stops making progress, sleeping `pacing_ms`
    /// after every completed task. Returns the outcome that ended the loop:
    /// a failed dispatch, `Finished`, `Paused`, `Stalled`, or `NotRunning`
    /// after a pause request.
    pub async fn run(&self, session: &mut Session) -> Result<StepOutcome, SessionError> {
        let pacing = Duration::from_millis(self.config.pacing_ms);
        loop {
            if self.pause_requests.take() && session.state() == ExecutionState::Running {
                tracing::info!(target: "taskforge.scheduler", "pause requested");
                self.pause(session)?;
            }

            let outcome = self.step(session).await?;
            if !outcome.can_continue() {
                return Ok(outcome);
            }

            if session.state() == ExecutionState::Running && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
        }
    }

    fn settle(&self, session: &mut Session) -> Result<StepOutcome, SessionError> {
        let plan = session.plan().ok_or(SessionError::NoPlan)?;

        if plan.all_completed() {
            self.transition(session, ExecutionState::Finished)?;
            return Ok(StepOutcome::Finished);
        }

        if plan.any_failed() {
            let failed = plan.task_ids_with_status(TaskStatus::Failed);
            self.transition(session, ExecutionState::Paused)?;
            return Ok(StepOutcome::Paused { failed });
        }

        let pending = plan.task_ids_with_status(TaskStatus::Pending);
        tracing::warn!(
            target: "taskforge.scheduler",
            pending = ?pending,
            "no task is ready; plan is stalled"
        );
        self.emit(SchedulerEvent::Stalled {
            pending: pending.clone(),
            timestamp: Utc::now(),
        });
        Ok(StepOutcome::Stalled { pending })
    }

    async fn dispatch(
        &self,
        session: &mut Session,
        task: Task,
    ) -> Result<StepOutcome, SessionError> {
        session.plan_mut()?.mark_running(&task.id)?;
        session.set_in_flight(Some(task.id.clone()));

        tracing::info!(
            target: "taskforge.scheduler",
            task_id = %task.id,
            role = %task.role_title,
            "task started"
        );
        self.emit(SchedulerEvent::TaskStarted {
            task_id: task.id.clone(),
            role: task.role_title.clone(),
            timestamp: Utc::now(),
        });

        let started = Instant::now();
        let executed = self.execute(session, &task).await;
        let result = match executed {
            Ok(output) => self.complete(session, &task, output).await,
            Err(err) => Err(err),
        };
        let duration_ms = started.elapsed().as_millis() as u64;
        session.set_in_flight(None);

        match result {
            Ok(artifact_id) => {
                tracing::info!(
                    target: "taskforge.scheduler",
                    task_id = %task.id,
                    artifact_id = artifact_id.as_deref().unwrap_or("-"),
                    duration_ms,
                    "task completed"
                );
                self.emit(SchedulerEvent::TaskCompleted {
                    task_id: task.id.clone(),
                    artifact_id: artifact_id.clone(),
                    duration_ms,
                    timestamp: Utc::now(),
                });
                Ok(StepOutcome::Dispatched {
                    task_id: task.id,
                    status: TaskStatus::Completed,
                    artifact_id,
                })
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(
                    target: "taskforge.scheduler",
                    task_id = %task.id,
                    error = %message,
                    duration_ms,
                    "task failed"
                );
                session.plan_mut()?.mark_failed(&task.id, message.clone())?;
                self.emit(SchedulerEvent::TaskFailed {
                    task_id: task.id.clone(),
                    error: message,
                    duration_ms,
                    timestamp: Utc::now(),
                });
                self.transition(session, ExecutionState::Paused)?;
                Ok(StepOutcome::Dispatched {
                    task_id: task.id,
                    status: TaskStatus::Failed,
                    artifact_id: None,
                })
            }
        }
    }

    async fn execute(&self, session: &Session, task: &Task) -> Result<AgentOutput, ExecutorError> {
        let plan = session
            .plan()
            .ok_or_else(|| ExecutorError::Execution("no plan loaded".to_string()))?;
        let role = plan
            .role(&task.role_title)
            .cloned()
            .ok_or_else(|| ExecutorError::RoleNotFound(task.role_title.clone()))?;
        let goal = plan.goal.clone();
        let context = self.context_for(session, task);

        tracing::debug!(
            target: "taskforge.scheduler",
            task_id = %task.id,
            executor = self.executor.name(),
            context_artifacts = context.len(),
            "invoking executor"
        );
        // Run on its own task so a panicking executor fails only this task.
        let executor = Arc::clone(&self.executor);
        let task = task.clone();
        let handle =
            tokio::spawn(async move { executor.execute(&task, &role, &goal, &context).await });
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                let payload = e.into_panic();
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(ExecutorError::Execution(format!("executor panicked: {reason}")))
            }
            Err(e) => Err(ExecutorError::Execution(format!("executor task aborted: {e}"))),
        }
    }

    /// Records the artifact (if any), folds team metadata into the plan and
    /// marks the task completed. Returns the new artifact id.
    async fn complete(
        &self,
        session: &mut Session,
        task: &Task,
        output: AgentOutput,
    ) -> Result<Option<String>, ExecutorError> {
        let artifact_id = match output.files() {
            Some(files) => Some(
                session
                    .record_artifact(&task.id, files.to_vec())
                    .await
                    .map_err(|e| ExecutorError::ArtifactRecord(e.to_string()))?,
            ),
            None => None,
        };

        let plan = session
            .plan_mut()
            .map_err(|e| ExecutorError::Execution(e.to_string()))?;
        if let Some(team) = output.team {
            plan.merge_team(team);
        }
        plan.mark_completed(&task.id, output.output, artifact_id.clone())
            .map_err(|e| ExecutorError::Execution(e.to_string()))?;
        Ok(artifact_id)
    }

    fn context_for(&self, session: &Session, task: &Task) -> Vec<Artifact> {
        let artifacts = session.artifacts();
        match self.config.context_mode {
            ContextMode::All => artifacts.snapshot(),
            ContextMode::Dependencies => {
                let Some(plan) = session.plan() else {
                    return Vec::new();
                };
                let deps: HashSet<String> = transitive_dependencies(plan.tasks(), &task.id);
                artifacts
                    .artifacts()
                    .iter()
                    .filter(|a| a.is_initial_context() || deps.contains(&a.task_id))
                    .cloned()
                    .collect()
            }
        }
    }

    fn transition(&self, session: &mut Session, to: ExecutionState) -> Result<(), SessionError> {
        let from = session.transition(to)?;
        tracing::info!(
            target: "taskforge.scheduler",
            from = %from,
            to = %to,
            "execution state changed"
        );
        self.emit(SchedulerEvent::StateChanged {
            from,
            to,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn emit(&self, event: SchedulerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
