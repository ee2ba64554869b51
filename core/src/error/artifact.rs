use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("duplicate artifact id: {0}")]
    DuplicateId(String),

    #[error("artifact '{id}' created at {created_at} is older than the latest recorded artifact ({latest})")]
    OutOfOrder {
        id: String,
        created_at: i64,
        latest: i64,
    },

    #[error("artifact persistence failed: {0}")]
    Persistence(String),
}

impl From<anyhow::Error> for ArtifactError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{err:#}"))
    }
}
