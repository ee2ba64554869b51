//! # Execution state
//!
//! Plan-level execution state machine (`idle -> running <-> paused ->
//! finished`) and the events the scheduler publishes as it moves.

pub mod transitions;
pub mod types;

pub use transitions::{StateTransition, TransitionError};
pub use types::{ExecutionState, SchedulerEvent};
