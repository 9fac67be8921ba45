use std::collections::BTreeMap;

use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::repository::RepositoryRecord},
};
use tracing::error;

use crate::{
    oracle::OracleOutcome,
    progress::{ProgressSink, ProgressStatus},
    prompt_branch::PromptBranch,
    repo_url::RepoIdentity,
    types::RepoSnapshot,
};

use super::{config::AnalysisConfig, services::PipelineServices};

pub struct PipelineContext<'a> {
    pub repo: &'a RepoIdentity,
    pub repo_url: String,
    pub viewer_id: Option<&'a str>,
    pub db: &'a SurrealDbClient,
    pub pipeline_config: &'a AnalysisConfig,
    pub services: &'a dyn PipelineServices,
    pub progress: &'a ProgressSink,
    pub snapshot: Option<RepoSnapshot>,
    pub languages: BTreeMap<String, u64>,
    pub prior: Option<RepositoryRecord>,
    pub branch: Option<PromptBranch>,
    pub outcome: Option<OracleOutcome>,
    pub record: Option<RepositoryRecord>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        repo: &'a RepoIdentity,
        viewer_id: Option<&'a str>,
        db: &'a SurrealDbClient,
        pipeline_config: &'a AnalysisConfig,
        services: &'a dyn PipelineServices,
        progress: &'a ProgressSink,
    ) -> Self {
        Self {
            repo,
            repo_url: repo.canonical_url(),
            viewer_id,
            db,
            pipeline_config,
            services,
            progress,
            snapshot: None,
            languages: BTreeMap::new(),
            prior: None,
            branch: None,
            outcome: None,
            record: None,
        }
    }

    pub fn emit(&self, status: ProgressStatus, message: impl Into<String>) {
        self.progress.emit(status, message);
    }

    pub fn snapshot(&self) -> Result<&RepoSnapshot, AppError> {
        self.snapshot
            .as_ref()
            .ok_or_else(|| AppError::InternalError("snapshot expected to be available".into()))
    }

    pub fn branch(&self) -> Result<&PromptBranch, AppError> {
        self.branch
            .as_ref()
            .ok_or_else(|| AppError::InternalError("prompt branch expected to be selected".into()))
    }

    pub fn take_outcome(&mut self) -> Result<OracleOutcome, AppError> {
        self.outcome.take().ok_or_else(|| {
            AppError::InternalError("oracle outcome expected to be available for saving".into())
        })
    }

    pub fn take_record(&mut self) -> Result<RepositoryRecord, AppError> {
        self.record.take().ok_or_else(|| {
            AppError::InternalError("repository record expected after a finished run".into())
        })
    }

    pub fn abort(&mut self, err: AppError) -> AppError {
        error!(
            repository = %self.repo_url,
            viewer_id = self.viewer_id.unwrap_or("anonymous"),
            error = %err,
            "analysis pipeline aborted"
        );
        err
    }
}
