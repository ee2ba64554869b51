use thiserror::Error;

use super::{ArtifactError, GraphError, PlanError, PlanningError};
use crate::state::TransitionError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("plan edit rejected: {0}")]
    Plan(#[from] PlanError),
    #[error("config error: {0}")]
    Config(String),
    #[error("command failed: {0}")]
    Command(String),
    #[error("execution paused: {0}")]
    Paused(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Errors surfaced by plan-level session operations (planning, replace, start).
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no plan loaded")]
    NoPlan,
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Planning(#[from] PlanningError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}
