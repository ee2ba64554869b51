//! Dependency-ordered, one-at-a-time task execution.
//!
//! This module provides:
//! - Readiness resolution over a plan's tasks
//! - Graph preflight (missing deps, unknown roles, cycles)
//! - The step-wise scheduler and its run loop
//! - The executor and planner seams
//!
//! # Architecture
//!
//! ```text
//! Session { plan, artifacts, state, in_flight }
//!   ↓
//! Scheduler::start()  (optional validate_plan preflight)
//!   ↓
//! Scheduler::step() → next_ready() → TaskExecutor::execute(task, role, goal, context)
//!   ↓
//! record artifact → mark completed | mark failed + pause
//!   ↓
//! StepOutcome { Dispatched | Finished | Paused | Stalled | ... }
//! ```

mod graph;
mod scheduler;
mod traits;
mod types;

pub use graph::{is_ready, next_ready, transitive_dependencies, validate_plan, PlanGraph};
pub use scheduler::{PauseHandle, Scheduler};
pub use traits::{Planner, TaskExecutor};
pub use types::{AgentOutput, ArtifactPayload, StepOutcome};
