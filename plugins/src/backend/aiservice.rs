use async_trait::async_trait;

use taskforge_core::api::{
    AgentOutput, AiServiceConfig, Artifact, ExecutorError, File, Plan, Planner, PlanningError,
    Role, Task, TaskExecutor,
};

use super::http_client::HttpClient;
use super::prompt::{
    executor_prompt, parse_agent_output, parse_plan, planner_prompt, EXECUTOR_SYSTEM_PROMPT,
    PLANNER_SYSTEM_PROMPT,
};

/// Runs each task as one chat completion against the AI service.
pub struct AiServiceExecutor {
    client: HttpClient,
    temperature: f32,
}

impl AiServiceExecutor {
    pub fn new(cfg: &AiServiceConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: HttpClient::new(
                cfg.base_url.clone(),
                cfg.api_key.clone(),
                cfg.model.clone(),
                cfg.timeout_ms,
            )?,
            temperature: cfg.temperature,
        })
    }
}

#[async_trait]
impl TaskExecutor for AiServiceExecutor {
    fn name(&self) -> &str {
        "aiservice"
    }

    async fn execute(
        &self,
        task: &Task,
        role: &Role,
        goal: &str,
        context: &[Artifact],
    ) -> Result<AgentOutput, ExecutorError> {
        let prompt = executor_prompt(task, role, goal, context);
        let text = self
            .client
            .complete_json(EXECUTOR_SYSTEM_PROMPT, &prompt, self.temperature)
            .await
            .map_err(|e| ExecutorError::Execution(format!("{e:#}")))?;
        if text.trim().is_empty() {
            return Err(ExecutorError::EmptyResponse);
        }

        let output = parse_agent_output(&text).map_err(|e| {
            tracing::warn!(
                target: "taskforge.aiservice",
                task_id = %task.id,
                error = %e,
                "failed to parse agent output"
            );
            ExecutorError::InvalidOutput(e)
        })?;
        tracing::debug!(
            target: "taskforge.aiservice",
            task_id = %task.id,
            files = output.files().map(<[File]>::len).unwrap_or(0),
            "agent output parsed"
        );
        Ok(output)
    }
}

/// Produces plans from a goal with one chat completion.
pub struct AiServicePlanner {
    client: HttpClient,
    temperature: f32,
}

impl AiServicePlanner {
    pub fn new(cfg: &AiServiceConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: HttpClient::new(
                cfg.base_url.clone(),
                cfg.api_key.clone(),
                cfg.model.clone(),
                cfg.timeout_ms,
            )?,
            temperature: cfg.temperature,
        })
    }
}

#[async_trait]
impl Planner for AiServicePlanner {
    fn name(&self) -> &str {
        "aiservice"
    }

    async fn plan(&self, goal: &str, initial_files: &[File]) -> Result<Plan, PlanningError> {
        if goal.trim().is_empty() {
            return Err(PlanningError::EmptyGoal);
        }
        let prompt = planner_prompt(goal, initial_files);
        let text = self
            .client
            .complete_json(PLANNER_SYSTEM_PROMPT, &prompt, self.temperature)
            .await
            .map_err(|e| PlanningError::Request(format!("{e:#}")))?;
        if text.trim().is_empty() {
            return Err(PlanningError::EmptyResponse);
        }

        let plan = parse_plan(&text, goal).map_err(PlanningError::InvalidOutput)?;
        tracing::info!(
            target: "taskforge.aiservice",
            roles = plan.roles().len(),
            tasks = plan.tasks().len(),
            "plan generated"
        );
        Ok(plan)
    }
}
