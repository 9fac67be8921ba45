use common::storage::types::repository::RepositoryRecord;
use serde::Serialize;

use crate::{
    changes::{ChangeBucket, ChangeSet},
    utils::llm_instructions::{full_analysis_prompt, patch_prompt},
};

/// How a run relates to the stored artifact, decided before any oracle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptBranch {
    /// No usable prior analysis.
    FirstRun { files: Vec<String> },
    /// The stored artifact already describes this exact content.
    CacheHit,
    /// Patch the stored artifact with a small change-set.
    MinorChange {
        current_summary: String,
        changed_files: Vec<String>,
    },
    /// Regenerate from the ranked file list, ignoring the stored artifact.
    MajorChange { files: Vec<String> },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    FirstRun,
    CacheHit,
    MinorChange,
    MajorChange,
}

impl PromptBranch {
    /// Decision table over the stored record, the fresh hash and the change-set.
    /// `changes` is `None` when no diff was attempted.
    pub fn select(
        prior: Option<&RepositoryRecord>,
        current_hash: &str,
        ranked_files: Vec<String>,
        changes: Option<&ChangeSet>,
        minor_limit: usize,
    ) -> Self {
        let Some(prior) = prior.filter(|record| record.last_commit_hash.is_some()) else {
            return PromptBranch::FirstRun {
                files: ranked_files,
            };
        };

        if prior.is_current(current_hash) {
            return PromptBranch::CacheHit;
        }

        match changes {
            Some(changes)
                if ChangeBucket::classify(changes.len(), minor_limit) == ChangeBucket::Minor =>
            {
                PromptBranch::MinorChange {
                    current_summary: prior.architecture_map.clone(),
                    changed_files: changes.files.clone(),
                }
            }
            _ => PromptBranch::MajorChange {
                files: ranked_files,
            },
        }
    }

    pub fn kind(&self) -> BranchKind {
        match self {
            PromptBranch::FirstRun { .. } => BranchKind::FirstRun,
            PromptBranch::CacheHit => BranchKind::CacheHit,
            PromptBranch::MinorChange { .. } => BranchKind::MinorChange,
            PromptBranch::MajorChange { .. } => BranchKind::MajorChange,
        }
    }

    /// Oracle instruction for this branch. A cache hit needs none.
    pub fn synthesize(&self, repo_name: &str) -> Option<String> {
        match self {
            PromptBranch::FirstRun { files } | PromptBranch::MajorChange { files } => {
                Some(full_analysis_prompt(repo_name, files))
            }
            PromptBranch::MinorChange {
                current_summary,
                changed_files,
            } => Some(patch_prompt(repo_name, current_summary, changed_files)),
            PromptBranch::CacheHit => None,
        }
    }
}
