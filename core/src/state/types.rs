//! Plan-level execution state and the events published while it changes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution state of a whole plan, distinct from individual task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    /// Nothing has been dispatched yet.
    #[default]
    Idle,
    /// The loop may dispatch tasks.
    Running,
    /// Dispatching suspended, explicitly or after a task failure.
    Paused,
    /// Every task completed.
    Finished,
    /// Whole-plan failure. Not reached by the step loop.
    Failed,
}

impl ExecutionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduler lifecycle events, broadcast to any subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulerEvent {
    StateChanged {
        from: ExecutionState,
        to: ExecutionState,
        timestamp: DateTime<Utc>,
    },
    TaskStarted {
        task_id: String,
        role: String,
        timestamp: DateTime<Utc>,
    },
    TaskCompleted {
        task_id: String,
        artifact_id: Option<String>,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    TaskFailed {
        task_id: String,
        error: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    Stalled {
        pending: Vec<String>,
        timestamp: DateTime<Utc>,
    },
}

impl SchedulerEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::StateChanged { timestamp, .. }
            | Self::TaskStarted { timestamp, .. }
            | Self::TaskCompleted { timestamp, .. }
            | Self::TaskFailed { timestamp, .. }
            | Self::Stalled { timestamp, .. } => *timestamp,
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::TaskStarted { task_id, .. }
            | Self::TaskCompleted { task_id, .. }
            | Self::TaskFailed { task_id, .. } => Some(task_id),
            _ => None,
        }
    }
}
