use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub first: String,
    pub second: String,
}

pub async fn compare_repositories(
    State(state): State<ApiState>,
    Json(request): Json<CompareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comparison = state
        .pipeline
        .compare(&request.first, &request.second)
        .await?;

    Ok(Json(json!({ "comparison": comparison })))
}
