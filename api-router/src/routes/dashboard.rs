use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use common::storage::{dashboard::ViewerDashboard, types::viewer_history::ViewerHistoryEntry};

use crate::{api_state::ApiState, error::ApiError, middleware_viewer::Viewer};

pub async fn get_dashboard(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = ViewerDashboard::load(viewer.require()?, &state.db).await?;

    Ok(Json(dashboard))
}

/// Forgets a repository for this viewer only.
pub async fn delete_history(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Path(repository_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted =
        ViewerHistoryEntry::delete_for_viewer(viewer.require()?, &repository_id, &state.db).await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "no history entry for repository {repository_id}"
        )))
    }
}
