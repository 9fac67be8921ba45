use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use common::{
    error::AppError,
    storage::types::{
        chat_message::{ChatMessage, ChatRole},
        repository::{RepositoryRecord, RepositoryView},
    },
};
use serde::Serialize;

use crate::{api_state::ApiState, error::ApiError};

pub const RECENT_REPOSITORIES_LIMIT: usize = 20;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ChatTranscript {
    pub context: String,
    pub messages: Vec<MessageView>,
}

impl From<ChatMessage> for MessageView {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            role: message.role,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

pub async fn recent_repositories(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let repositories: Vec<RepositoryView> =
        RepositoryRecord::recent(RECENT_REPOSITORIES_LIMIT, &state.db)
            .await?
            .iter()
            .map(RepositoryRecord::to_view)
            .collect();

    Ok(Json(repositories))
}

/// Transcript plus the artifact framed as context for the chat collaborator.
pub async fn repository_messages(
    State(state): State<ApiState>,
    Path(repository_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(repository) = state
        .db
        .get_item::<RepositoryRecord>(&repository_id)
        .await
        .map_err(AppError::from)?
    else {
        return Err(ApiError::NotFound(format!(
            "repository {repository_id} not found"
        )));
    };

    let messages: Vec<MessageView> = ChatMessage::list_for_repository(&repository_id, &state.db)
        .await?
        .into_iter()
        .map(MessageView::from)
        .collect();

    Ok(Json(ChatTranscript {
        context: repository.chat_context(),
        messages,
    }))
}
