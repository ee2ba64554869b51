use thiserror::Error;

use crate::plan::TaskStatus;

/// Rejected structural edit or status transition on a plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("no plan loaded")]
    NoPlan,

    #[error("plan cannot be edited while execution is running")]
    EditWhileRunning,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("duplicate role title: {0}")]
    DuplicateRole(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("unknown role '{role}' on task '{task_id}'")]
    UnknownRole { task_id: String, role: String },

    #[error("unknown dependency '{dep}' on task '{task_id}'")]
    UnknownDependency { task_id: String, dep: String },

    #[error("task '{0}' cannot depend on itself")]
    SelfDependency(String),

    #[error("task '{task_id}' cannot move from {from} to {to}")]
    InvalidStatusTransition {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
}

/// Structural problems found by the dependency-graph preflight.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate task ID: {0}")]
    DuplicateTaskId(String),

    #[error("Task '{0}' depends on itself")]
    SelfDependency(String),

    #[error("Dependency not found: task '{task_id}' depends on '{missing_dep}'")]
    DependencyNotFound { task_id: String, missing_dep: String },

    #[error("Role not found: task '{task_id}' is assigned to '{role}'")]
    RoleNotFound { task_id: String, role: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),
}
