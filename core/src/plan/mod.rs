//! Plan data model: roles, tasks, team metadata and the edit surface.

mod edit;
mod model;

pub use edit::TaskEdit;
pub use model::{Plan, PlanProgress, Prompt, Role, Task, TaskStatus, Team};
