use std::collections::BTreeMap;

use async_trait::async_trait;
use common::error::AppError;

use crate::{
    repo_url::RepoIdentity,
    types::{OracleReply, RepoSnapshot},
    utils::{github::GithubClient, llm::OpenAiOracle},
};

/// External collaborators of a run: the source host and the summarization oracle.
#[async_trait]
pub trait PipelineServices: Send + Sync {
    async fn fetch_snapshot(&self, repo: &RepoIdentity) -> Result<RepoSnapshot, AppError>;

    async fn fetch_languages(
        &self,
        repo: &RepoIdentity,
    ) -> Result<BTreeMap<String, u64>, AppError>;

    async fn compare_commits(
        &self,
        repo: &RepoIdentity,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>, AppError>;

    async fn summarize(&self, prompt: &str) -> Result<OracleReply, AppError>;
}

pub struct DefaultPipelineServices {
    github: GithubClient,
    oracle: OpenAiOracle,
}

impl DefaultPipelineServices {
    pub fn new(github: GithubClient, oracle: OpenAiOracle) -> Self {
        Self { github, oracle }
    }
}

#[async_trait]
impl PipelineServices for DefaultPipelineServices {
    async fn fetch_snapshot(&self, repo: &RepoIdentity) -> Result<RepoSnapshot, AppError> {
        self.github.repo_snapshot(repo).await
    }

    async fn fetch_languages(
        &self,
        repo: &RepoIdentity,
    ) -> Result<BTreeMap<String, u64>, AppError> {
        self.github.languages(repo).await
    }

    async fn compare_commits(
        &self,
        repo: &RepoIdentity,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>, AppError> {
        self.github.compare(repo, base, head).await
    }

    async fn summarize(&self, prompt: &str) -> Result<OracleReply, AppError> {
        self.oracle.complete(prompt).await
    }
}
