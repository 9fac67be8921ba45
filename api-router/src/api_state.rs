use std::sync::Arc;

use analysis_pipeline::{
    utils::{github::GithubClient, llm::OpenAiOracle},
    AnalysisConfig, AnalysisPipeline,
};
use async_openai::{config::OpenAIConfig, Client};
use common::{storage::db::SurrealDbClient, utils::config::AppConfig};

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub pipeline: Arc<AnalysisPipeline>,
}

impl ApiState {
    pub async fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let surreal_db_client = Arc::new(
            SurrealDbClient::new(
                &config.surrealdb_address,
                &config.surrealdb_username,
                &config.surrealdb_password,
                &config.surrealdb_namespace,
                &config.surrealdb_database,
            )
            .await?,
        );

        surreal_db_client.ensure_initialized().await?;

        let openai_client = Arc::new(Client::with_config(
            OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));

        let pipeline_config = AnalysisConfig::from_app_config(config);
        let github = GithubClient::new(
            &config.github_api_base,
            config.github_token.clone(),
            pipeline_config.tuning.snapshot_attempts,
        )?;
        let oracle = OpenAiOracle::new(openai_client, config.analysis_model.clone());

        let pipeline = Arc::new(AnalysisPipeline::new(
            Arc::clone(&surreal_db_client),
            github,
            oracle,
            pipeline_config,
        ));

        Ok(Self {
            db: surreal_db_client,
            config: config.clone(),
            pipeline,
        })
    }
}
