mod config;
mod context;
mod services;
mod stages;
mod state;

pub use config::{AnalysisConfig, AnalysisTuning};
#[allow(clippy::module_name_repetitions)]
pub use services::{DefaultPipelineServices, PipelineServices};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::repository::RepositoryRecord},
};
use futures::Stream;
use tracing::{info, warn};

use crate::{
    progress::{AnalysisResult, AnalysisUpdate, ProgressSink},
    prompt_branch::BranchKind,
    repo_url::RepoIdentity,
    utils::{github::GithubClient, llm::OpenAiOracle, llm_instructions::comparison_prompt},
};

use self::{
    context::PipelineContext,
    stages::{analyze, connect, fetch_snapshot, persist, rank_files, serve_cached, FetchOutcome},
    state::connecting,
};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub record: RepositoryRecord,
    pub branch: BranchKind,
}

#[allow(clippy::module_name_repetitions)]
pub struct AnalysisPipeline {
    db: Arc<SurrealDbClient>,
    pipeline_config: AnalysisConfig,
    services: Arc<dyn PipelineServices>,
}

impl AnalysisPipeline {
    pub fn new(
        db: Arc<SurrealDbClient>,
        github: GithubClient,
        oracle: OpenAiOracle,
        pipeline_config: AnalysisConfig,
    ) -> Self {
        let services = DefaultPipelineServices::new(github, oracle);
        Self::with_services(db, pipeline_config, Arc::new(services))
    }

    pub fn with_services(
        db: Arc<SurrealDbClient>,
        pipeline_config: AnalysisConfig,
        services: Arc<dyn PipelineServices>,
    ) -> Self {
        Self {
            db,
            pipeline_config,
            services,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.pipeline_config
    }

    /// Runs to completion and returns the terminal record only.
    pub async fn analyze(&self, url: &str, viewer_id: Option<&str>) -> AnalysisResult {
        self.run_to_result(url, viewer_id, &ProgressSink::disabled())
            .await
    }

    /// Progress records in order, then exactly one terminal record. The run continues in a
    /// spawned task even if the stream is dropped.
    pub fn analyze_stream(
        self: &Arc<Self>,
        url: String,
        viewer_id: Option<String>,
    ) -> impl Stream<Item = AnalysisUpdate> + Send + 'static {
        let (sink, mut rx) = ProgressSink::channel();
        let pipeline = Arc::clone(self);

        tokio::spawn(async move {
            let result = pipeline
                .run_to_result(&url, viewer_id.as_deref(), &sink)
                .await;
            sink.finish(result);
        });

        async_stream::stream! {
            while let Some(update) = rx.recv().await {
                let terminal = update.is_terminal();
                yield update;
                if terminal {
                    return;
                }
            }
            yield AnalysisUpdate::Finished(AnalysisResult::failure(
                "Analysis ended unexpectedly",
            ));
        }
    }

    async fn run_to_result(
        &self,
        url: &str,
        viewer_id: Option<&str>,
        progress: &ProgressSink,
    ) -> AnalysisResult {
        match self.run(url, viewer_id, progress).await {
            Ok(report) => AnalysisResult::success(report.record.to_view()),
            Err(err) => AnalysisResult::from_error(&err),
        }
    }

    /// Validates the URL, then walks the state machine. Input errors are reported before any
    /// collaborator is contacted.
    #[tracing::instrument(skip_all, fields(url = %url, viewer_id = viewer_id.unwrap_or("anonymous")))]
    pub async fn run(
        &self,
        url: &str,
        viewer_id: Option<&str>,
        progress: &ProgressSink,
    ) -> Result<AnalysisReport, AppError> {
        let repo = RepoIdentity::parse(url, &self.pipeline_config.source_host)?;
        self.drive_pipeline(&repo, viewer_id, progress).await
    }

    fn duration_millis(duration: Duration) -> u64 {
        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }

    #[tracing::instrument(
        skip_all,
        fields(repository = %repo, viewer_id = viewer_id.unwrap_or("anonymous"))
    )]
    async fn drive_pipeline(
        &self,
        repo: &RepoIdentity,
        viewer_id: Option<&str>,
        progress: &ProgressSink,
    ) -> Result<AnalysisReport, AppError> {
        let mut ctx = PipelineContext::new(
            repo,
            viewer_id,
            self.db.as_ref(),
            &self.pipeline_config,
            self.services.as_ref(),
            progress,
        );

        let machine = connecting();
        let pipeline_started = Instant::now();

        let machine = connect(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;

        let stage_start = Instant::now();
        let fetched = fetch_snapshot(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let fetch_ms = Self::duration_millis(stage_start.elapsed());

        let branch = match fetched {
            FetchOutcome::Cached(machine) => {
                let stage_start = Instant::now();
                let _machine = serve_cached(machine, &mut ctx)
                    .await
                    .map_err(|err| ctx.abort(err))?;
                info!(
                    repository = %ctx.repo_url,
                    total_ms = Self::duration_millis(pipeline_started.elapsed()),
                    fetch_ms,
                    serve_ms = Self::duration_millis(stage_start.elapsed()),
                    "analysis served from cache"
                );
                BranchKind::CacheHit
            }
            FetchOutcome::Stale(machine) => {
                let stage_start = Instant::now();
                let machine = rank_files(machine, &mut ctx)
                    .await
                    .map_err(|err| ctx.abort(err))?;
                let rank_ms = Self::duration_millis(stage_start.elapsed());
                let branch = ctx.branch()?.kind();

                let stage_start = Instant::now();
                let machine = analyze(machine, &mut ctx)
                    .await
                    .map_err(|err| ctx.abort(err))?;
                let analyze_ms = Self::duration_millis(stage_start.elapsed());

                let stage_start = Instant::now();
                let _machine = persist(machine, &mut ctx)
                    .await
                    .map_err(|err| ctx.abort(err))?;
                let persist_ms = Self::duration_millis(stage_start.elapsed());

                info!(
                    repository = %ctx.repo_url,
                    branch = ?branch,
                    total_ms = Self::duration_millis(pipeline_started.elapsed()),
                    fetch_ms,
                    rank_ms,
                    analyze_ms,
                    persist_ms,
                    "analysis pipeline finished"
                );
                branch
            }
        };

        let record = ctx.take_record()?;
        Ok(AnalysisReport { record, branch })
    }

    /// Side-by-side comparison of two analyzed repositories. Oracle failures surface as errors.
    #[tracing::instrument(skip(self))]
    pub async fn compare(&self, first_id: &str, second_id: &str) -> Result<String, AppError> {
        let first: Option<RepositoryRecord> = self.db.get_item(first_id).await?;
        let second: Option<RepositoryRecord> = self.db.get_item(second_id).await?;
        let (Some(first), Some(second)) = (first, second) else {
            return Err(AppError::NotFound(
                "one or both repositories have not been analyzed".into(),
            ));
        };

        let prompt = comparison_prompt(
            &format!("{}/{}", first.owner, first.name),
            &first.architecture_map,
            &format!("{}/{}", second.owner, second.name),
            &second.architecture_map,
        );

        let reply = tokio::time::timeout(
            self.pipeline_config.tuning.oracle_timeout,
            self.services.summarize(&prompt),
        )
        .await
        .map_err(|_| {
            warn!(first_id, second_id, "comparison timed out");
            AppError::Oracle("comparison timed out".into())
        })??;

        Ok(reply.text)
    }
}
