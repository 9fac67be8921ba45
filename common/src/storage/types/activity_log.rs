use chrono::Duration as ChronoDuration;
use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

/// Activity is kept for recency display only.
pub const ACTIVITY_RETENTION_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityAction {
    #[serde(rename = "INGEST")]
    Ingest,
    #[serde(rename = "VIEW")]
    View,
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityAction::Ingest => write!(f, "INGEST"),
            ActivityAction::View => write!(f, "VIEW"),
        }
    }
}

stored_object!(ActivityRecord, "activity_log", {
    viewer_id: String,
    action: ActivityAction,
    details: String,
    #[serde(serialize_with = "serialize_datetime", deserialize_with = "deserialize_datetime")]
    timestamp: DateTime<Utc>
});

impl ActivityRecord {
    pub fn new(viewer_id: String, action: ActivityAction, details: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            viewer_id,
            action,
            details,
            timestamp: now,
        }
    }

    pub fn retention() -> ChronoDuration {
        ChronoDuration::days(ACTIVITY_RETENTION_DAYS)
    }

    pub async fn append(
        viewer_id: &str,
        action: ActivityAction,
        details: String,
        db: &SurrealDbClient,
    ) -> Result<Self, AppError> {
        let record = Self::new(viewer_id.to_string(), action, details);
        let stored: Option<Self> = db.store_item(record).await?;
        stored.ok_or_else(|| AppError::InternalError("activity record was not stored".into()))
    }

    /// Newest first, limited to the retention window ending at `now`.
    pub async fn recent_for_viewer(
        viewer_id: &str,
        limit: usize,
        now: DateTime<Utc>,
        db: &SurrealDbClient,
    ) -> Result<Vec<Self>, AppError> {
        let cutoff = now
            .checked_sub_signed(Self::retention())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let records: Vec<Self> = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE viewer_id = $viewer_id AND timestamp > $cutoff ORDER BY timestamp DESC LIMIT $limit",
            )
            .bind(("table", Self::table_name()))
            .bind(("viewer_id", viewer_id.to_string()))
            .bind(("cutoff", surrealdb::sql::Datetime::from(cutoff)))
            .bind(("limit", limit))
            .await?
            .take(0)?;

        Ok(records)
    }

    /// Deletes records older than the retention window; returns how many were removed.
    pub async fn purge_expired(now: DateTime<Utc>, db: &SurrealDbClient) -> Result<usize, AppError> {
        let cutoff = now
            .checked_sub_signed(Self::retention())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let removed: Vec<Self> = db
            .client
            .query("DELETE activity_log WHERE timestamp <= $cutoff RETURN BEFORE")
            .bind(("cutoff", surrealdb::sql::Datetime::from(cutoff)))
            .await?
            .take(0)?;

        Ok(removed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> SurrealDbClient {
        let db = SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .expect("Failed to start in-memory surrealdb");
        db.ensure_initialized()
            .await
            .expect("Failed to initialize schema");
        db
    }

    fn aged(viewer: &str, days: i64) -> ActivityRecord {
        let mut record = ActivityRecord::new(
            viewer.into(),
            ActivityAction::Ingest,
            format!("{days} days old"),
        );
        record.timestamp = Utc::now() - ChronoDuration::days(days);
        record
    }

    #[test]
    fn actions_serialize_as_upper_case_tags() {
        assert_eq!(
            serde_json::to_value(ActivityAction::Ingest).expect("serializes"),
            "INGEST"
        );
        assert_eq!(ActivityAction::View.to_string(), "VIEW");
    }

    #[tokio::test]
    async fn recent_for_viewer_filters_viewer_and_window() {
        let db = setup_db().await;
        ActivityRecord::append("viewer-1", ActivityAction::Ingest, "Analyzed acme/one".into(), &db)
            .await
            .expect("append");
        ActivityRecord::append("viewer-1", ActivityAction::View, "Revisited acme/one".into(), &db)
            .await
            .expect("append");
        ActivityRecord::append("viewer-2", ActivityAction::View, "other".into(), &db)
            .await
            .expect("append");
        db.store_item(aged("viewer-1", 8)).await.expect("store aged");

        let recent = ActivityRecord::recent_for_viewer("viewer-1", 20, Utc::now(), &db)
            .await
            .expect("recent");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent.first().map(|r| r.action), Some(ActivityAction::View));

        let limited = ActivityRecord::recent_for_viewer("viewer-1", 1, Utc::now(), &db)
            .await
            .expect("recent limited");
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn purge_expired_removes_only_old_records() {
        let db = setup_db().await;
        db.store_item(aged("viewer-1", 10)).await.expect("store");
        db.store_item(aged("viewer-1", 8)).await.expect("store");
        db.store_item(aged("viewer-1", 1)).await.expect("store");

        let removed = ActivityRecord::purge_expired(Utc::now(), &db)
            .await
            .expect("purge");
        assert_eq!(removed, 2);

        let remaining = db
            .get_all_stored_items::<ActivityRecord>()
            .await
            .expect("select");
        assert_eq!(remaining.len(), 1);
    }
}
