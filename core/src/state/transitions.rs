//! Execution-state transition rules.

use super::types::ExecutionState;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ExecutionState,
        to: ExecutionState,
    },
    #[error("Cannot transition from terminal state {state}")]
    FromTerminalState { state: ExecutionState },
}

pub struct StateTransition;

impl StateTransition {
    pub fn validate(from: ExecutionState, to: ExecutionState) -> Result<(), TransitionError> {
        if Self::is_terminal(from) {
            return Err(TransitionError::FromTerminalState { state: from });
        }

        let is_valid = match (from, to) {
            // start / resume
            (ExecutionState::Idle, ExecutionState::Running) => true,
            (ExecutionState::Paused, ExecutionState::Running) => true,

            // explicit pause, or pause after a task failure
            (ExecutionState::Running, ExecutionState::Paused) => true,

            (ExecutionState::Running, ExecutionState::Finished) => true,
            (ExecutionState::Running, ExecutionState::Failed) => true,

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    pub fn is_terminal(state: ExecutionState) -> bool {
        matches!(state, ExecutionState::Finished | ExecutionState::Failed)
    }

    /// Whether a start/resume command is meaningful from `state`.
    pub fn can_start(state: ExecutionState) -> bool {
        matches!(state, ExecutionState::Idle | ExecutionState::Paused)
    }
}
