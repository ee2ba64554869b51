//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `taskforge_core::api` instead of reaching into internal modules.

pub use crate::artifact::{
    group_label, Artifact, ArtifactGroup, ArtifactRepository, ArtifactStore, CombinedEntry,
    ExportEntry, File, FileTree, InMemoryArtifactRepository, TreeNode, ViewMode,
    INITIAL_CONTEXT_TASK_ID,
};
pub use crate::config::{
    get_data_dir, load_default, load_from, AiServiceConfig, AppConfig, ContextMode,
    LoggingConfig, SchedulerConfig, StorageConfig,
};
pub use crate::error::{
    ArtifactError, CliError, ExecutorError, GraphError, PlanError, PlanningError, SessionError,
};
pub use crate::executor::{
    is_ready, next_ready, validate_plan, AgentOutput, ArtifactPayload, PauseHandle, PlanGraph,
    Planner, Scheduler, StepOutcome, TaskExecutor,
};
pub use crate::plan::{Plan, PlanProgress, Prompt, Role, Task, TaskEdit, TaskStatus, Team};
pub use crate::session::Session;
pub use crate::state::{ExecutionState, SchedulerEvent, StateTransition, TransitionError};
