use serde::{Deserialize, Serialize};

use crate::artifact::File;
use crate::plan::{TaskStatus, Team};
use crate::state::ExecutionState;

/// Files an executor wants recorded for the task it just ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPayload {
    #[serde(default)]
    pub files: Vec<File>,
}

/// Successful result of one task execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
}

impl AgentOutput {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn with_files(mut self, files: Vec<File>) -> Self {
        self.artifact = Some(ArtifactPayload { files });
        self
    }

    /// Files to record, if any. An empty file list produces no artifact.
    pub fn files(&self) -> Option<&[File]> {
        self.artifact
            .as_ref()
            .map(|a| a.files.as_slice())
            .filter(|f| !f.is_empty())
    }
}

/// What a single scheduler step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The plan is not in the `running` state; nothing was done.
    NotRunning { state: ExecutionState },
    /// A task is already in flight; nothing was dispatched.
    Busy { task_id: String },
    /// One task was executed. `status` is `completed` or `failed`.
    Dispatched {
        task_id: String,
        status: TaskStatus,
        artifact_id: Option<String>,
    },
    /// Every task completed; the plan is now `finished`.
    Finished,
    /// Nothing is ready and at least one task failed; the plan is now `paused`.
    Paused { failed: Vec<String> },
    /// Nothing is ready, nothing failed, and not everything completed. The
    /// state is left `running`.
    Stalled { pending: Vec<String> },
}

impl StepOutcome {
    /// Whether another step could make progress without outside action.
    pub fn can_continue(&self) -> bool {
        matches!(
            self,
            Self::Dispatched {
                status: TaskStatus::Completed,
                ..
            }
        )
    }
}
