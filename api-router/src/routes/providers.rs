use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::api_state::ApiState;

/// Which external credentials are configured. Never exposes the values.
pub async fn provider_status(State(state): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "has_oracle_key": state.config.has_oracle_key(),
        "has_github_token": state.config.has_github_token(),
    }))
}
