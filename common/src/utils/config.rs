use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub openai_api_key: String,
    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    pub surrealdb_database: String,
    pub http_port: u16,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_analysis_model")]
    pub analysis_model: String,
    #[serde(default)]
    pub github_token: Option<String>,
    #[serde(default = "default_github_api_base")]
    pub github_api_base: String,
    #[serde(default = "default_source_host")]
    pub source_host: String,
    #[serde(default = "default_oracle_timeout_secs")]
    pub oracle_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_analysis_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_source_host() -> String {
    "github.com".to_string()
}

fn default_oracle_timeout_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn has_oracle_key(&self) -> bool {
        !self.openai_api_key.trim().is_empty()
    }

    pub fn has_github_token(&self) -> bool {
        self.github_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
