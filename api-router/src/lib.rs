use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware::from_fn,
    routing::{delete, get, post},
    Router,
};
use middleware_viewer::viewer_identity;
use routes::{
    analyze::{analyze_repository, analyze_repository_stream},
    compare::compare_repositories,
    dashboard::{delete_history, get_dashboard},
    liveness::live,
    providers::provider_status,
    readiness::ready,
    repositories::{recent_repositories, repository_messages},
};

pub mod api_state;
pub mod error;
pub mod middleware_viewer;
mod routes;

/// Request bodies are a URL or a pair of ids.
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Public, unauthenticated endpoints (for k8s/systemd probes)
    let public = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live))
        .route("/providers", get(provider_status));

    // Endpoints that may act on behalf of a viewer
    let analysis = Router::new()
        .route("/analyze", post(analyze_repository))
        .route("/analyze/stream", post(analyze_repository_stream))
        .route("/repositories", get(recent_repositories))
        .route("/repositories/{id}/messages", get(repository_messages))
        .route("/compare", post(compare_repositories))
        .route("/dashboard", get(get_dashboard))
        .route("/history/{repository_id}", delete(delete_history))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .route_layer(from_fn(viewer_identity));

    public.merge(analysis)
}
