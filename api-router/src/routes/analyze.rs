use analysis_pipeline::{AnalysisResult, AnalysisUpdate};
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use futures::StreamExt;
use serde::Deserialize;

use crate::{api_state::ApiState, middleware_viewer::Viewer};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

/// Pipeline outcomes, including failures, are reported in the body with a 200.
pub async fn analyze_repository(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Json(request): Json<AnalyzeRequest>,
) -> Json<AnalysisResult> {
    Json(state.pipeline.analyze(&request.url, viewer.id()).await)
}

/// Newline-delimited JSON: progress records, then one terminal record.
pub async fn analyze_repository_stream(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    Json(request): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let updates = state
        .pipeline
        .analyze_stream(request.url, viewer.0)
        .map(encode_line);

    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(updates),
    )
}

fn encode_line(update: AnalysisUpdate) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(&update)?;
    line.push('\n');
    Ok(line)
}
