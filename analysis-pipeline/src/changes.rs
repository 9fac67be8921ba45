use tracing::warn;

use crate::{pipeline::PipelineServices, repo_url::RepoIdentity};

/// Paths that differ between two content-identity hashes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub files: Vec<String>,
    /// More paths changed than the resolution limit; only the first ones are kept.
    pub truncated: bool,
    /// The diff could not be fetched; `files` is empty in that case.
    pub fetch_failed: bool,
}

impl ChangeSet {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Magnitude of change since the last analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeBucket {
    /// Hashes are equal.
    None,
    /// `1..minor_limit` files changed; the prior summary can be patched.
    Minor,
    /// No usable change-set, or too many files changed; analyze from scratch.
    Major,
}

impl ChangeBucket {
    /// Zero changed files counts as major: an empty diff between different hashes gives
    /// the oracle nothing to patch with.
    pub fn classify(changed: usize, minor_limit: usize) -> Self {
        if changed > 0 && changed < minor_limit {
            ChangeBucket::Minor
        } else {
            ChangeBucket::Major
        }
    }
}

/// Fail-open diff between two hashes: any fetch error yields an empty, flagged change-set.
pub async fn detect_changes(
    services: &dyn PipelineServices,
    repo: &RepoIdentity,
    old_hash: &str,
    new_hash: &str,
    resolution_limit: usize,
) -> ChangeSet {
    match services.compare_commits(repo, old_hash, new_hash).await {
        Ok(mut files) => {
            let truncated = files.len() > resolution_limit;
            files.truncate(resolution_limit);
            ChangeSet {
                files,
                truncated,
                fetch_failed: false,
            }
        }
        Err(err) => {
            warn!(
                repository = %repo,
                old_hash,
                new_hash,
                error = %err,
                "change detection failed; treating change-set as empty"
            );
            ChangeSet {
                files: Vec::new(),
                truncated: false,
                fetch_failed: true,
            }
        }
    }
}
