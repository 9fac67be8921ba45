use common::{
    error::AppError,
    storage::types::{
        activity_log::{ActivityAction, ActivityRecord},
        repository::{RepositoryRecord, RepositoryUpdate},
        viewer_history::ViewerHistoryEntry,
    },
};
use state_machines::core::GuardError;
use tracing::{debug, instrument, warn};

use crate::{
    changes::detect_changes,
    diagram,
    oracle::invoke_oracle,
    progress::ProgressStatus,
    prompt_branch::PromptBranch,
    ranking::top_ranked,
};

use super::{
    context::PipelineContext,
    state::{AnalysisMachine, Analyzing, CacheHit, Connecting, Done, Fetching, Ranking, Saving},
};

/// Where a run goes after the snapshot has been compared to the stored record.
pub enum FetchOutcome {
    Cached(AnalysisMachine<(), CacheHit>),
    Stale(AnalysisMachine<(), Ranking>),
}

#[instrument(
    level = "trace",
    skip_all,
    fields(repository = %ctx.repo_url, viewer_id = ctx.viewer_id.unwrap_or("anonymous"))
)]
pub async fn connect(
    machine: AnalysisMachine<(), Connecting>,
    ctx: &mut PipelineContext<'_>,
) -> Result<AnalysisMachine<(), Fetching>, AppError> {
    ctx.emit(ProgressStatus::Connecting, "Connecting to storage...");

    ctx.db.client.query("RETURN true").await?.check()?;

    machine
        .connect()
        .map_err(|(_, guard)| map_guard_error("connect", &guard))
}

#[instrument(
    level = "trace",
    skip_all,
    fields(repository = %ctx.repo_url, viewer_id = ctx.viewer_id.unwrap_or("anonymous"))
)]
pub async fn fetch_snapshot(
    machine: AnalysisMachine<(), Fetching>,
    ctx: &mut PipelineContext<'_>,
) -> Result<FetchOutcome, AppError> {
    ctx.emit(
        ProgressStatus::Fetching,
        format!("Fetching {} from {}...", ctx.repo.slug(), ctx.repo.host),
    );

    let (snapshot, languages) = tokio::join!(
        ctx.services.fetch_snapshot(ctx.repo),
        ctx.services.fetch_languages(ctx.repo)
    );
    let snapshot = snapshot?;
    let languages = languages.unwrap_or_else(|err| {
        warn!(
            repository = %ctx.repo_url,
            error = %err,
            "language statistics unavailable; continuing without them"
        );
        Default::default()
    });

    let prior = RepositoryRecord::find_by_url(&ctx.repo_url, ctx.db).await?;

    debug!(
        repository = %ctx.repo_url,
        files = snapshot.files.len(),
        content_hash = %snapshot.content_hash,
        has_prior = prior.is_some(),
        "snapshot fetched"
    );

    let current = prior
        .as_ref()
        .is_some_and(|record| record.is_current(&snapshot.content_hash));

    ctx.snapshot = Some(snapshot);
    ctx.languages = languages;
    ctx.prior = prior;

    if current {
        ctx.branch = Some(PromptBranch::CacheHit);
        machine
            .reuse()
            .map(FetchOutcome::Cached)
            .map_err(|(_, guard)| map_guard_error("reuse", &guard))
    } else {
        machine
            .rank()
            .map(FetchOutcome::Stale)
            .map_err(|(_, guard)| map_guard_error("rank", &guard))
    }
}

#[instrument(
    level = "trace",
    skip_all,
    fields(repository = %ctx.repo_url, viewer_id = ctx.viewer_id.unwrap_or("anonymous"))
)]
pub async fn rank_files(
    machine: AnalysisMachine<(), Ranking>,
    ctx: &mut PipelineContext<'_>,
) -> Result<AnalysisMachine<(), Analyzing>, AppError> {
    ctx.emit(ProgressStatus::Ranking, "Ranking files by importance...");

    let tuning = &ctx.pipeline_config.tuning;
    let snapshot = ctx.snapshot()?;
    let current_hash = snapshot.content_hash.clone();
    let ranked = top_ranked(&snapshot.file_paths(), tuning.top_n_files);

    let previous_hash = ctx
        .prior
        .as_ref()
        .and_then(|record| record.last_commit_hash.clone())
        .filter(|hash| *hash != current_hash);

    let changes = match previous_hash {
        Some(previous) => Some(
            detect_changes(
                ctx.services,
                ctx.repo,
                &previous,
                &current_hash,
                tuning.change_resolution_limit,
            )
            .await,
        ),
        None => None,
    };

    let branch = PromptBranch::select(
        ctx.prior.as_ref(),
        &current_hash,
        ranked,
        changes.as_ref(),
        tuning.minor_change_limit,
    );

    debug!(
        repository = %ctx.repo_url,
        branch = ?branch.kind(),
        changed = changes.as_ref().map_or(0, |set| set.len()),
        change_fetch_failed = changes.as_ref().is_some_and(|set| set.fetch_failed),
        change_set_truncated = changes.as_ref().is_some_and(|set| set.truncated),
        "prompt branch selected"
    );

    ctx.branch = Some(branch);

    machine
        .analyze()
        .map_err(|(_, guard)| map_guard_error("analyze", &guard))
}

#[instrument(
    level = "trace",
    skip_all,
    fields(repository = %ctx.repo_url, viewer_id = ctx.viewer_id.unwrap_or("anonymous"))
)]
pub async fn analyze(
    machine: AnalysisMachine<(), Analyzing>,
    ctx: &mut PipelineContext<'_>,
) -> Result<AnalysisMachine<(), Saving>, AppError> {
    ctx.emit(ProgressStatus::Analyzing, "Generating architecture summary...");

    let prompt = ctx.branch()?.synthesize(&ctx.repo.name).ok_or_else(|| {
        AppError::InternalError("no prompt for a cached analysis".into())
    })?;

    let outcome = invoke_oracle(
        ctx.services,
        &prompt,
        ctx.pipeline_config.tuning.oracle_timeout,
    )
    .await;

    if outcome.degraded.is_none() {
        for violation in diagram::lint(&outcome.text) {
            warn!(
                repository = %ctx.repo_url,
                line = violation.line,
                reason = %violation.reason,
                "diagram does not follow the formatting contract"
            );
        }
    }

    debug!(
        repository = %ctx.repo_url,
        token_usage = outcome.token_usage,
        degraded = ?outcome.degraded,
        artifact_chars = outcome.text.chars().count(),
        "oracle finished"
    );

    ctx.outcome = Some(outcome);

    machine
        .save()
        .map_err(|(_, guard)| map_guard_error("save", &guard))
}

#[instrument(
    level = "trace",
    skip_all,
    fields(repository = %ctx.repo_url, viewer_id = ctx.viewer_id.unwrap_or("anonymous"))
)]
pub async fn persist(
    machine: AnalysisMachine<(), Saving>,
    ctx: &mut PipelineContext<'_>,
) -> Result<AnalysisMachine<(), Done>, AppError> {
    ctx.emit(ProgressStatus::Saving, "Saving analysis...");

    let outcome = ctx.take_outcome()?;
    let content_hash = ctx.snapshot()?.content_hash.clone();

    let record = RepositoryRecord::upsert(
        RepositoryUpdate {
            url: ctx.repo_url.clone(),
            name: ctx.repo.name.clone(),
            owner: ctx.repo.owner.clone(),
            languages: std::mem::take(&mut ctx.languages),
            architecture_map: outcome.text,
            last_commit_hash: content_hash,
            token_usage: outcome.token_usage,
        },
        ctx.db,
    )
    .await?;

    record_visit(
        ctx,
        &record,
        ActivityAction::Ingest,
        format!("Analyzed repository {}", ctx.repo.slug()),
    )
    .await?;

    ctx.emit(ProgressStatus::Complete, "Analysis complete.");
    ctx.record = Some(record);

    machine
        .finish()
        .map_err(|(_, guard)| map_guard_error("finish", &guard))
}

#[instrument(
    level = "trace",
    skip_all,
    fields(repository = %ctx.repo_url, viewer_id = ctx.viewer_id.unwrap_or("anonymous"))
)]
pub async fn serve_cached(
    machine: AnalysisMachine<(), CacheHit>,
    ctx: &mut PipelineContext<'_>,
) -> Result<AnalysisMachine<(), Done>, AppError> {
    ctx.emit(
        ProgressStatus::Found,
        "Repository unchanged since the last analysis; returning it.",
    );

    let record = ctx.prior.take().ok_or_else(|| {
        AppError::InternalError("cached record expected to be available".into())
    })?;

    record_visit(
        ctx,
        &record,
        ActivityAction::View,
        format!("Revisited {}", ctx.repo.slug()),
    )
    .await?;

    ctx.record = Some(record);

    machine
        .finish()
        .map_err(|(_, guard)| map_guard_error("finish", &guard))
}

/// History and activity are only kept for identified viewers.
async fn record_visit(
    ctx: &PipelineContext<'_>,
    record: &RepositoryRecord,
    action: ActivityAction,
    details: String,
) -> Result<(), AppError> {
    let Some(viewer_id) = ctx.viewer_id else {
        return Ok(());
    };

    ViewerHistoryEntry::touch(viewer_id, &record.id, ctx.db).await?;
    ActivityRecord::append(viewer_id, action, details, ctx.db).await?;
    Ok(())
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid analysis pipeline transition during {event}: {guard:?}"
    ))
}
