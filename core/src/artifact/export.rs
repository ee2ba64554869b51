use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

use super::store::{group_label, insert_latest, ArtifactStore};
use super::tree::normalize_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// One folder per artifact.
    Grouped,
    /// Latest version of every path.
    #[default]
    Combined,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grouped => f.write_str("grouped"),
            Self::Combined => f.write_str("combined"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grouped" => Ok(Self::Grouped),
            "combined" => Ok(Self::Combined),
            other => Err(format!("unknown view mode '{other}' (expected grouped|combined)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportEntry {
    pub path: String,
    pub content: String,
}

impl ArtifactStore {
    /// Flattens the chosen view into relative paths ready to be written out.
    pub fn export(&self, view: ViewMode) -> Vec<ExportEntry> {
        match view {
            ViewMode::Combined => self
                .combined_files()
                .into_iter()
                .map(|(path, entry)| ExportEntry {
                    path,
                    content: entry.content,
                })
                .collect(),
            ViewMode::Grouped => self
                .artifacts()
                .iter()
                .flat_map(|artifact| {
                    let folder = group_label(artifact);
                    let mut files = BTreeMap::new();
                    for file in &artifact.files {
                        let path = normalize_path(&file.path);
                        if !path.is_empty() {
                            insert_latest(&mut files, path, file.content.clone());
                        }
                    }
                    files.into_iter().map(move |(path, content)| ExportEntry {
                        path: format!("{folder}/{path}"),
                        content,
                    })
                })
                .collect(),
        }
    }
}
