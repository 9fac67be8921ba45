use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::api_state::ApiState;

/// Readiness probe: 200 when storage answers, else 503. A missing oracle key is reported
/// but does not fail readiness, since runs degrade to the fallback artifact.
pub async fn ready(State(state): State<ApiState>) -> impl IntoResponse {
    let oracle = if state.config.has_oracle_key() {
        "ok"
    } else {
        "unconfigured"
    };

    match state.db.client.query("RETURN true").await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "checks": { "db": "ok", "oracle": oracle }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "checks": { "db": "fail", "oracle": oracle },
                "reason": e.to_string()
            })),
        ),
    }
}
