use serde::{Deserialize, Serialize};

/// Task id recorded on the artifact that carries user-supplied files
/// attached at planning time.
pub const INITIAL_CONTEXT_TASK_ID: &str = "initial-context";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Slash-separated relative path.
    pub path: String,
    pub content: String,
}

impl File {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Immutable bundle of files produced by one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "taskId")]
    pub task_id: String,
    #[serde(default)]
    pub files: Vec<File>,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl Artifact {
    /// New artifact with a fresh v4 id.
    pub fn new(task_id: impl Into<String>, files: Vec<File>, created_at: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            files,
            created_at,
        }
    }

    pub fn is_initial_context(&self) -> bool {
        self.task_id == INITIAL_CONTEXT_TASK_ID
    }

    /// Short id prefix used in labels and export folder names.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(4) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_wire_field_names() {
        let artifact = Artifact {
            id: "abcd1234".into(),
            task_id: "t1".into(),
            files: vec![File::new("a.txt", "x")],
            created_at: 42,
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["taskId"], "t1");
        assert_eq!(json["createdAt"], 42);
        assert_eq!(artifact.short_id(), "abcd");
    }

    #[test]
    fn test_short_id_of_short_id() {
        let artifact = Artifact {
            id: "ab".into(),
            task_id: "t".into(),
            files: vec![],
            created_at: 0,
        };
        assert_eq!(artifact.short_id(), "ab");
    }
}
