use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Source host error: {0}")]
    SourceHost(String),
    #[error("Oracle error: {0}")]
    Oracle(String),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Message safe to hand across the external boundary.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::SourceHost(_)
            | AppError::Oracle(_) => self.to_string(),
            AppError::Database(_) => "Storage is unavailable, please retry later".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}
