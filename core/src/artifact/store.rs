use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::model::{Artifact, File};
use super::tree::{normalize_path, FileTree, TreeEntry};
use crate::error::ArtifactError;

/// One grouped-view entry: the tree of a single artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactGroup {
    pub artifact_id: String,
    pub task_id: String,
    /// Display label, e.g. `Task_build_ab12`.
    pub label: String,
    pub created_at: i64,
    pub tree: FileTree,
}

/// Winning version of one path in the combined view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinedEntry {
    pub content: String,
    pub artifact_id: String,
}

/// Append-only history of artifacts in creation order.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    history: Vec<Artifact>,
    ids: HashSet<String>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted artifacts, sorting them by
    /// `created_at` first. Duplicate ids are dropped with a warning.
    pub fn from_history(mut artifacts: Vec<Artifact>) -> Self {
        artifacts.sort_by_key(|a| a.created_at);
        let mut store = Self::new();
        for artifact in artifacts {
            if store.ids.contains(&artifact.id) {
                tracing::warn!(
                    target: "taskforge.artifacts",
                    artifact_id = %artifact.id,
                    "dropping duplicate persisted artifact"
                );
                continue;
            }
            store.ids.insert(artifact.id.clone());
            store.history.push(artifact);
        }
        store
    }

    /// Appends an artifact. Duplicate ids and timestamps older than the
    /// latest artifact are rejected.
    pub fn record(&mut self, artifact: Artifact) -> Result<(), ArtifactError> {
        if self.ids.contains(&artifact.id) {
            return Err(ArtifactError::DuplicateId(artifact.id));
        }
        if let Some(latest) = self.latest_created_at() {
            if artifact.created_at < latest {
                return Err(ArtifactError::OutOfOrder {
                    id: artifact.id,
                    created_at: artifact.created_at,
                    latest,
                });
            }
        }
        tracing::debug!(
            target: "taskforge.artifacts",
            artifact_id = %artifact.id,
            task_id = %artifact.task_id,
            files = artifact.files.len(),
            "artifact recorded"
        );
        self.ids.insert(artifact.id.clone());
        self.history.push(artifact);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.ids.clear();
    }

    /// Timestamp for the next artifact: `now`, bumped past the latest
    /// recorded artifact so that creation order stays strictly increasing.
    pub fn next_timestamp(&self, now_millis: i64) -> i64 {
        match self.latest_created_at() {
            Some(latest) if now_millis <= latest => latest + 1,
            _ => now_millis,
        }
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.history
    }

    pub fn get(&self, artifact_id: &str) -> Option<&Artifact> {
        self.history.iter().find(|a| a.id == artifact_id)
    }

    /// Artifacts produced by `task_id`, oldest first.
    pub fn by_task<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a Artifact> + 'a {
        self.history.iter().filter(move |a| a.task_id == task_id)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Owned copy of the history, in order.
    pub fn snapshot(&self) -> Vec<Artifact> {
        self.history.clone()
    }

    pub fn grouped_view(&self) -> Vec<ArtifactGroup> {
        self.history
            .iter()
            .map(|artifact| ArtifactGroup {
                artifact_id: artifact.id.clone(),
                task_id: artifact.task_id.clone(),
                label: group_label(artifact),
                created_at: artifact.created_at,
                tree: FileTree::build(artifact.files.iter().map(|f| TreeEntry {
                    path: f.path.clone(),
                    content: f.content.clone(),
                    artifact_id: Some(artifact.id.clone()),
                })),
            })
            .collect()
    }

    /// Latest version of every path: later artifacts overwrite earlier ones,
    /// and within one artifact later files overwrite earlier ones. A file
    /// written over an older directory (or inside an older file's path)
    /// drops the entries it shadows, so no two keys conflict.
    pub fn combined_files(&self) -> BTreeMap<String, CombinedEntry> {
        let mut merged = BTreeMap::new();
        for artifact in &self.history {
            for File { path, content } in &artifact.files {
                let path = normalize_path(path);
                if path.is_empty() {
                    continue;
                }
                insert_latest(
                    &mut merged,
                    path,
                    CombinedEntry {
                        content: content.clone(),
                        artifact_id: artifact.id.clone(),
                    },
                );
            }
        }
        merged
    }

    pub fn combined_view(&self) -> FileTree {
        FileTree::build(
            self.combined_files()
                .into_iter()
                .map(|(path, entry)| TreeEntry {
                    path,
                    content: entry.content,
                    artifact_id: Some(entry.artifact_id),
                }),
        )
    }

    fn latest_created_at(&self) -> Option<i64> {
        self.history.last().map(|a| a.created_at)
    }
}

/// Inserts `path`, first removing every entry that would clash with it as a
/// file: its descendants (`path/...`) and its ancestors (`a` for `a/b`).
pub(crate) fn insert_latest<V>(merged: &mut BTreeMap<String, V>, path: String, value: V) {
    let prefix = format!("{path}/");
    let shadowed: Vec<String> = merged
        .range(prefix.clone()..)
        .take_while(|(key, _)| key.starts_with(&prefix))
        .map(|(key, _)| key.clone())
        .collect();
    for key in shadowed {
        merged.remove(&key);
    }
    let mut ancestor = String::new();
    for segment in path.split('/') {
        if !ancestor.is_empty() && merged.remove(&ancestor).is_some() {
            tracing::debug!(
                target: "taskforge.artifacts",
                path = %ancestor,
                "file replaced by a directory"
            );
        }
        if !ancestor.is_empty() {
            ancestor.push('/');
        }
        ancestor.push_str(segment);
    }
    merged.insert(path, value);
}

/// Folder/label name for one artifact in grouped output.
pub fn group_label(artifact: &Artifact) -> String {
    format!("Task_{}_{}", artifact.task_id, artifact.short_id())
}
