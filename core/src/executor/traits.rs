use async_trait::async_trait;

use super::types::AgentOutput;
use crate::artifact::{Artifact, File};
use crate::error::{ExecutorError, PlanningError};
use crate::plan::{Plan, Role, Task};

/// Performs the work of a single task.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    fn name(&self) -> &str;

    /// `context` holds previously recorded artifacts, oldest first.
    async fn execute(
        &self,
        task: &Task,
        role: &Role,
        goal: &str,
        context: &[Artifact],
    ) -> Result<AgentOutput, ExecutorError>;
}

/// Turns a goal into a plan.
#[async_trait]
pub trait Planner: Send + Sync {
    fn name(&self) -> &str;

    /// Every task of the returned plan must be `pending`.
    async fn plan(&self, goal: &str, initial_files: &[File]) -> Result<Plan, PlanningError>;
}
