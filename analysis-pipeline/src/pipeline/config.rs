use std::time::Duration;

use common::utils::config::AppConfig;

#[derive(Debug, Clone)]
pub struct AnalysisTuning {
    pub top_n_files: usize,
    pub minor_change_limit: usize,
    pub change_resolution_limit: usize,
    pub oracle_timeout: Duration,
    pub snapshot_attempts: usize,
}

impl Default for AnalysisTuning {
    fn default() -> Self {
        Self {
            top_n_files: 100,
            minor_change_limit: 20,
            change_resolution_limit: 300,
            oracle_timeout: Duration::from_secs(60),
            snapshot_attempts: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub tuning: AnalysisTuning,
    pub source_host: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tuning: AnalysisTuning::default(),
            source_host: "github.com".to_string(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            tuning: AnalysisTuning {
                oracle_timeout: Duration::from_secs(config.oracle_timeout_secs),
                ..AnalysisTuning::default()
            },
            source_host: config.source_host.clone(),
        }
    }
}
