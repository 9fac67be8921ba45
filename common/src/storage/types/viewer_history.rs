use crate::{
    error::AppError,
    storage::db::{retry_on_conflict, SurrealDbClient},
    stored_object,
};

use super::deterministic_id;

const TOUCH_HISTORY: &str = r"
    UPSERT type::thing('viewer_history', $id) SET
        viewer_id = $viewer_id,
        repository_id = $repository_id,
        last_visited = $now,
        created_at = (created_at OR $now),
        updated_at = $now
    RETURN AFTER;
";

stored_object!(ViewerHistoryEntry, "viewer_history", {
    viewer_id: String,
    repository_id: String,
    #[serde(serialize_with = "serialize_datetime", deserialize_with = "deserialize_datetime")]
    last_visited: DateTime<Utc>
});

impl ViewerHistoryEntry {
    pub fn id_for(viewer_id: &str, repository_id: &str) -> String {
        deterministic_id(&[viewer_id, repository_id])
    }

    /// Creates the (viewer, repository) entry or refreshes its last-visited time.
    pub async fn touch(
        viewer_id: &str,
        repository_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Self, AppError> {
        let id = Self::id_for(viewer_id, repository_id);

        let entry: Option<Self> = retry_on_conflict(|| {
            let id = id.clone();
            let viewer_id = viewer_id.to_string();
            let repository_id = repository_id.to_string();
            async move {
                db.client
                    .query(TOUCH_HISTORY)
                    .bind(("id", id))
                    .bind(("viewer_id", viewer_id))
                    .bind(("repository_id", repository_id))
                    .bind(("now", surrealdb::sql::Datetime::from(Utc::now())))
                    .await?
                    .take(0)
            }
        })
        .await?;

        entry.ok_or_else(|| AppError::InternalError("history upsert returned no entry".into()))
    }

    /// Entries for a viewer, most recently visited first.
    pub async fn for_viewer(viewer_id: &str, db: &SurrealDbClient) -> Result<Vec<Self>, AppError> {
        let entries: Vec<Self> = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE viewer_id = $viewer_id ORDER BY last_visited DESC",
            )
            .bind(("table", Self::table_name()))
            .bind(("viewer_id", viewer_id.to_string()))
            .await?
            .take(0)?;

        Ok(entries)
    }

    /// Removes the viewer's entry only; the repository record is left alone.
    pub async fn delete_for_viewer(
        viewer_id: &str,
        repository_id: &str,
        db: &SurrealDbClient,
    ) -> Result<bool, AppError> {
        let deleted: Option<Self> = db
            .delete_item(&Self::id_for(viewer_id, repository_id))
            .await?;
        Ok(deleted.is_some())
    }
}
