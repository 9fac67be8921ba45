use std::{collections::BTreeMap, time::Duration};

use common::error::AppError;
use reqwest::{header, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};
use tracing::{debug, warn};

use crate::{
    repo_url::RepoIdentity,
    types::{FileKind, FileNode, RepoSnapshot},
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Directory names whose whole subtree is dropped from snapshots.
const IGNORED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build"];
/// File suffixes dropped from snapshots.
const IGNORED_SUFFIXES: &[&str] = &["package-lock.json", ".png", ".jpg", ".svg"];

#[derive(Deserialize)]
struct RepoResponse {
    default_branch: String,
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: CommitRef,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
}

#[derive(Deserialize)]
struct CompareResponse {
    #[serde(default)]
    files: Vec<CompareFile>,
}

#[derive(Deserialize)]
struct CompareFile {
    filename: String,
}

/// Read-only client for the GitHub REST API.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
    snapshot_attempts: usize,
}

impl GithubClient {
    pub fn new(
        api_base: &str,
        token: Option<String>,
        snapshot_attempts: usize,
    ) -> Result<Self, AppError> {
        let http = reqwest::ClientBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            snapshot_attempts: snapshot_attempts.max(1),
        })
    }

    /// Default branch head commit plus its recursive tree, retried on transient failures.
    pub async fn repo_snapshot(&self, repo: &RepoIdentity) -> Result<RepoSnapshot, AppError> {
        let strategy = ExponentialBackoff::from_millis(100)
            .map(jitter)
            .take(self.snapshot_attempts.saturating_sub(1));

        RetryIf::spawn(
            strategy,
            || self.snapshot_once(repo),
            |err: &AppError| {
                let retry = !matches!(err, AppError::NotFound(_) | AppError::Validation(_));
                if retry {
                    warn!(repository = %repo, error = %err, "snapshot fetch failed; retrying");
                }
                retry
            },
        )
        .await
    }

    async fn snapshot_once(&self, repo: &RepoIdentity) -> Result<RepoSnapshot, AppError> {
        let base = repo_path(repo);
        let info: RepoResponse = self.get_json(&base, repo).await?;
        let branch: BranchResponse = self
            .get_json(&format!("{base}/branches/{}", info.default_branch), repo)
            .await?;
        let sha = branch.commit.sha;
        let tree: TreeResponse = self
            .get_json(&format!("{base}/git/trees/{sha}?recursive=1"), repo)
            .await?;

        if tree.truncated {
            warn!(repository = %repo, "source host truncated the file tree");
        }

        let files = filter_tree(tree.tree);
        debug!(repository = %repo, files = files.len(), head = %sha, "fetched snapshot");

        Ok(RepoSnapshot {
            content_hash: sha,
            files,
        })
    }

    /// Language name to byte count.
    pub async fn languages(&self, repo: &RepoIdentity) -> Result<BTreeMap<String, u64>, AppError> {
        self.get_json(&format!("{}/languages", repo_path(repo)), repo)
            .await
    }

    /// Paths changed between two commits.
    pub async fn compare(
        &self,
        repo: &RepoIdentity,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>, AppError> {
        let comparison: CompareResponse = self
            .get_json(&format!("{}/compare/{base}...{head}", repo_path(repo)), repo)
            .await?;
        Ok(comparison.files.into_iter().map(|f| f.filename).collect())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        repo: &RepoIdentity,
    ) -> Result<T, AppError> {
        let mut request = self
            .http
            .get(format!("{}{path}", self.api_base))
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!(
                "repository {} not found",
                repo.slug()
            ))),
            status => Err(AppError::SourceHost(format!(
                "{} responded with {status} for {}",
                repo.host,
                repo.slug()
            ))),
        }
    }
}

fn repo_path(repo: &RepoIdentity) -> String {
    format!("/repos/{}/{}", repo.owner, repo.name)
}

fn is_ignored(path: &str) -> bool {
    path.split('/').any(|segment| IGNORED_DIRS.contains(&segment))
        || IGNORED_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

fn filter_tree(entries: Vec<TreeEntry>) -> Vec<FileNode> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let kind = match entry.kind.as_str() {
                "blob" => FileKind::Blob,
                "tree" => FileKind::Tree,
                _ => return None,
            };
            let path = entry.path?;
            (!is_ignored(&path)).then_some(FileNode {
                path,
                kind,
                size: entry.size,
            })
        })
        .collect()
}
