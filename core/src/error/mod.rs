#[allow(clippy::module_inception)]
pub mod error;
pub mod artifact;
pub mod executor;
pub mod plan;

pub use artifact::ArtifactError;
pub use error::{CliError, SessionError};
pub use executor::{ExecutorError, PlanningError};
pub use plan::{GraphError, PlanError};
