use thiserror::Error;

/// Failure of a single dispatched task.
///
/// The display string is what lands in `Task::error`, so `Execution` carries
/// the executor's message verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("{0}")]
    Execution(String),

    #[error("role '{0}' not found in plan")]
    RoleNotFound(String),

    #[error("executor returned no output")]
    EmptyResponse,

    #[error("executor output could not be interpreted: {0}")]
    InvalidOutput(String),

    #[error("failed to record artifact: {0}")]
    ArtifactRecord(String),
}

/// Failure of the planning collaborator. No plan is created or replaced.
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("goal must not be empty")]
    EmptyGoal,

    #[error("planner request failed: {0}")]
    Request(String),

    #[error("planner returned no output")]
    EmptyResponse,

    #[error("planner output could not be interpreted: {0}")]
    InvalidOutput(String),
}
