use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs},
    Client,
};
use common::error::AppError;
use tracing::debug;

use crate::types::OracleReply;

/// Chat-completions client for any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiOracle {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiOracle {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub async fn complete(&self, prompt: &str) -> Result<OracleReply, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([ChatCompletionRequestUserMessage::from(prompt.to_string()).into()])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Oracle("No content found in oracle response".into()))?;
        let total_tokens = response
            .usage
            .map_or(0, |usage| u64::from(usage.total_tokens));

        debug!(model = %self.model, total_tokens, "oracle completion received");

        Ok(OracleReply { text, total_tokens })
    }
}
