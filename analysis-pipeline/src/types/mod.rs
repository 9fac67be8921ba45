use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Blob,
    Tree,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileNode {
    pub path: String,
    pub kind: FileKind,
    pub size: Option<u64>,
}

impl FileNode {
    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FileKind::Blob,
            size: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::Blob
    }
}

/// Current file list of a repository plus the opaque token identifying that exact state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSnapshot {
    pub content_hash: String,
    pub files: Vec<FileNode>,
}

impl RepoSnapshot {
    /// Paths of files only; directory entries carry no signal for ranking.
    pub fn file_paths(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|node| node.is_file())
            .map(|node| node.path.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleReply {
    pub text: String,
    pub total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_paths_skip_directories() {
        let snapshot = RepoSnapshot {
            content_hash: "abc".into(),
            files: vec![
                FileNode {
                    path: "src".into(),
                    kind: FileKind::Tree,
                    size: None,
                },
                FileNode::blob("src/main.rs"),
                FileNode::blob("Cargo.toml"),
            ],
        };

        assert_eq!(snapshot.file_paths(), ["src/main.rs", "Cargo.toml"]);
    }
}
