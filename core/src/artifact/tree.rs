//! Hierarchical view over flat slash-separated file paths.

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    Dir {
        name: String,
        path: String,
        children: Vec<TreeNode>,
    },
    File {
        name: String,
        path: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        artifact_id: Option<String>,
    },
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Dir { name, .. } | Self::File { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Dir { path, .. } | Self::File { path, .. } => path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Dir { .. })
    }
}

/// One input entry for [`FileTree::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub content: String,
    pub artifact_id: Option<String>,
}

/// Directories sort before files; names compare byte-wise within each group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileTree {
    pub roots: Vec<TreeNode>,
}

enum Pending {
    Dir(BTreeMap<String, Pending>),
    File {
        content: String,
        artifact_id: Option<String>,
    },
}

impl FileTree {
    /// Builds a tree from flat entries. When two entries claim the same
    /// node (including a file and a directory with the same name), the later
    /// entry wins. Empty and `.` segments are ignored; entries whose path is
    /// empty after that are skipped.
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = TreeEntry>,
    {
        let mut root: BTreeMap<String, Pending> = BTreeMap::new();
        for entry in entries {
            let segments = split_path(&entry.path);
            if segments.is_empty() {
                tracing::debug!(
                    target: "taskforge.artifacts",
                    path = %entry.path,
                    "skipping empty path"
                );
                continue;
            }
            insert(&mut root, &segments, entry.content, entry.artifact_id);
        }
        Self {
            roots: finish(root, ""),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// File nodes in display order.
    pub fn files(&self) -> Vec<&TreeNode> {
        let mut out = Vec::new();
        collect_files(&self.roots, &mut out);
        out
    }

    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let segments = split_path(path);
        let (last, parents) = segments.split_last()?;
        let mut level = &self.roots;
        for segment in parents {
            match level.iter().find(|n| n.name() == *segment) {
                Some(TreeNode::Dir { children, .. }) => level = children,
                _ => return None,
            }
        }
        level.iter().find(|n| n.name() == *last)
    }

    /// ASCII rendering, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_level(&self.roots, "", &mut out);
        out
    }
}

pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Canonical form of a path: normalized segments joined with `/`.
pub(crate) fn normalize_path(path: &str) -> String {
    split_path(path).join("/")
}

fn insert(
    level: &mut BTreeMap<String, Pending>,
    segments: &[&str],
    content: String,
    artifact_id: Option<String>,
) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        level.insert(
            first.to_string(),
            Pending::File {
                content,
                artifact_id,
            },
        );
        return;
    }
    let node = level
        .entry(first.to_string())
        .or_insert_with(|| Pending::Dir(BTreeMap::new()));
    if matches!(node, Pending::File { .. }) {
        *node = Pending::Dir(BTreeMap::new());
    }
    if let Pending::Dir(children) = node {
        insert(children, rest, content, artifact_id);
    }
}

fn finish(level: BTreeMap<String, Pending>, prefix: &str) -> Vec<TreeNode> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for (name, node) in level {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        match node {
            Pending::Dir(children) => {
                let children = finish(children, &path);
                dirs.push(TreeNode::Dir {
                    name,
                    path,
                    children,
                });
            }
            Pending::File {
                content,
                artifact_id,
            } => files.push(TreeNode::File {
                name,
                path,
                content,
                artifact_id,
            }),
        }
    }
    dirs.extend(files);
    dirs
}

fn collect_files<'a>(nodes: &'a [TreeNode], out: &mut Vec<&'a TreeNode>) {
    for node in nodes {
        match node {
            TreeNode::Dir { children, .. } => collect_files(children, out),
            TreeNode::File { .. } => out.push(node),
        }
    }
}

fn render_level(nodes: &[TreeNode], indent: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let branch = if last { "`-- " } else { "|-- " };
        out.push_str(indent);
        out.push_str(branch);
        out.push_str(node.name());
        if let TreeNode::Dir { children, .. } = node {
            out.push_str("/\n");
            let child_indent = format!("{indent}{}", if last { "    " } else { "|   " });
            render_level(children, &child_indent, out);
        } else {
            out.push('\n');
        }
    }
}
