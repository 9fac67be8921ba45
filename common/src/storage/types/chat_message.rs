#![allow(clippy::module_name_repetitions)]
use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

#[derive(Deserialize, Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

stored_object!(ChatMessage, "chat_message", {
    repository_id: String,
    role: ChatRole,
    content: String
});

impl ChatMessage {
    pub fn new(repository_id: String, role: ChatRole, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            repository_id,
            role,
            content,
        }
    }

    /// Transcript for one repository in creation order.
    pub async fn list_for_repository(
        repository_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Vec<Self>, AppError> {
        let messages: Vec<Self> = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE repository_id = $repository_id ORDER BY created_at",
            )
            .bind(("table", Self::table_name()))
            .bind(("repository_id", repository_id.to_string()))
            .await?
            .take(0)?;

        Ok(messages)
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.content)
    }
}
