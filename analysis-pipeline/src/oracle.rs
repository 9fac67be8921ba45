use std::time::Duration;

use tracing::warn;

use crate::pipeline::PipelineServices;

pub const FALLBACK_ARTIFACT: &str =
    "The AI was unable to summarize this repo in time, but the files are indexed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    TimedOut,
    Failed,
}

/// Oracle result after timeout and failure handling. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleOutcome {
    pub text: String,
    pub token_usage: u64,
    pub degraded: Option<Degradation>,
}

impl OracleOutcome {
    fn fallback(reason: Degradation) -> Self {
        Self {
            text: FALLBACK_ARTIFACT.to_string(),
            token_usage: 0,
            degraded: Some(reason),
        }
    }
}

/// Calls the oracle under a hard time budget. A timeout, a transport error or an empty
/// answer all degrade to the fixed fallback text with zero token usage.
pub async fn invoke_oracle(
    services: &dyn PipelineServices,
    prompt: &str,
    budget: Duration,
) -> OracleOutcome {
    match tokio::time::timeout(budget, services.summarize(prompt)).await {
        Ok(Ok(reply)) if !reply.text.trim().is_empty() => OracleOutcome {
            text: reply.text,
            token_usage: reply.total_tokens,
            degraded: None,
        },
        Ok(Ok(_)) => {
            warn!("oracle returned an empty answer; using fallback artifact");
            OracleOutcome::fallback(Degradation::Failed)
        }
        Ok(Err(err)) => {
            warn!(error = %err, "oracle call failed; using fallback artifact");
            OracleOutcome::fallback(Degradation::Failed)
        }
        Err(_) => {
            warn!(
                budget_secs = budget.as_secs(),
                "oracle call timed out; using fallback artifact"
            );
            OracleOutcome::fallback(Degradation::TimedOut)
        }
    }
}
