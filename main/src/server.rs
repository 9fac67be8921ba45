use std::{sync::Arc, time::Duration};

use api_router::{api_routes_v1, api_state::ApiState};
use axum::Router;
use chrono::Utc;
use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::activity_log::ActivityRecord},
    utils::config::get_config,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How often expired activity is swept.
const RETENTION_SWEEP_PERIOD: Duration = Duration::from_secs(60 * 60);

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    // Connects storage, applies the schema and wires the pipeline
    let api_state = ApiState::new(&config).await?;

    tokio::spawn(run_retention_sweeper(
        Arc::clone(&api_state.db),
        RETENTION_SWEEP_PERIOD,
    ));

    // Create Axum router
    let app = Router::new()
        .nest("/api/v1", api_routes_v1())
        .with_state(api_state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_retention_sweeper(db: Arc<SurrealDbClient>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        if let Err(e) = sweep_expired_activity(&db).await {
            error!("Activity retention sweep failed: {}", e);
        }
    }
}

async fn sweep_expired_activity(db: &SurrealDbClient) -> Result<usize, AppError> {
    let removed = ActivityRecord::purge_expired(Utc::now(), db).await?;
    if removed > 0 {
        info!(removed, "Purged expired activity records");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_pipeline::{
        utils::{github::GithubClient, llm::OpenAiOracle},
        AnalysisConfig, AnalysisPipeline,
    };
    use axum::{body::Body, http::Request, http::StatusCode};
    use common::{
        storage::types::{activity_log::ActivityAction, StoredObject},
        utils::config::AppConfig,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    fn smoke_test_config(namespace: &str, database: &str) -> AppConfig {
        AppConfig {
            openai_api_key: "test-key".into(),
            surrealdb_address: "mem://".into(),
            surrealdb_username: "root".into(),
            surrealdb_password: "root".into(),
            surrealdb_namespace: namespace.into(),
            surrealdb_database: database.into(),
            http_port: 0,
            openai_base_url: "https://example.com".into(),
            analysis_model: "test-model".into(),
            github_token: None,
            github_api_base: "https://example.com".into(),
            source_host: "github.com".into(),
            oracle_timeout_secs: 5,
        }
    }

    async fn memory_db() -> Arc<SurrealDbClient> {
        let db = SurrealDbClient::memory("test_ns", &format!("test_db_{}", Uuid::new_v4()))
            .await
            .expect("failed to start in-memory surrealdb");
        db.ensure_initialized()
            .await
            .expect("failed to initialize schema");
        Arc::new(db)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn smoke_startup_with_in_memory_surrealdb() {
        let db = memory_db().await;
        let config = smoke_test_config("test_ns", "smoke");

        let openai_client = Arc::new(async_openai::Client::with_config(
            async_openai::config::OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));
        let github = GithubClient::new(&config.github_api_base, None, 1)
            .expect("failed to build github client");
        let oracle = OpenAiOracle::new(openai_client, config.analysis_model.clone());
        let pipeline = AnalysisPipeline::new(
            Arc::clone(&db),
            github,
            oracle,
            AnalysisConfig::from_app_config(&config),
        );

        let api_state = ApiState {
            db,
            config,
            pipeline: Arc::new(pipeline),
        };

        let app = Router::new()
            .nest("/api/v1", api_routes_v1())
            .with_state(api_state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/live")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let ready_response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/ready")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("ready response");
        assert_eq!(ready_response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_activity() {
        let db = memory_db().await;

        let mut expired = ActivityRecord::new(
            "viewer-1".into(),
            ActivityAction::Ingest,
            "Analyzed repository acme/old".into(),
        );
        expired.timestamp = Utc::now() - ActivityRecord::retention() - chrono::Duration::days(1);
        db.store_item(expired).await.expect("store expired");

        let fresh = ActivityRecord::new(
            "viewer-1".into(),
            ActivityAction::View,
            "Revisited acme/new".into(),
        );
        let fresh_id = fresh.get_id().to_string();
        db.store_item(fresh).await.expect("store fresh");

        let removed = sweep_expired_activity(&db).await.expect("sweep");
        assert_eq!(removed, 1);

        let remaining: Vec<ActivityRecord> = db.get_all_stored_items().await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, fresh_id);
    }
}
