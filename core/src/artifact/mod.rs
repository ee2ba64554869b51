//! Versioned artifact history with grouped and combined (latest-wins) views.

mod export;
mod model;
mod repository;
mod store;
mod tree;

pub use export::{ExportEntry, ViewMode};
pub use model::{Artifact, File, INITIAL_CONTEXT_TASK_ID};
pub use repository::{ArtifactRepository, InMemoryArtifactRepository};
pub use store::{group_label, ArtifactGroup, ArtifactStore, CombinedEntry};
pub use tree::{FileTree, TreeEntry, TreeNode};
