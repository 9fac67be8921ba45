use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;

use super::{
    db::SurrealDbClient,
    types::{
        activity_log::ActivityRecord,
        repository::{RepositoryRecord, RepositoryView},
        viewer_history::ViewerHistoryEntry,
    },
};

pub const DASHBOARD_ACTIVITY_LIMIT: usize = 20;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub last_visited: DateTime<Utc>,
    pub repository: RepositoryView,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_repos: usize,
    pub token_usage_total: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewerDashboard {
    pub history: Vec<HistoryItem>,
    pub activity: Vec<ActivityItem>,
    pub stats: DashboardStats,
}

impl ViewerDashboard {
    /// History joined with repositories, recent activity and aggregate stats for one viewer.
    /// History entries whose repository no longer exists are skipped.
    pub async fn load(viewer_id: &str, db: &SurrealDbClient) -> Result<Self, AppError> {
        let entries = ViewerHistoryEntry::for_viewer(viewer_id, db).await?;

        let mut history = Vec::with_capacity(entries.len());
        for entry in entries {
            let repository: Option<RepositoryRecord> = db.get_item(&entry.repository_id).await?;
            if let Some(repository) = repository {
                history.push(HistoryItem {
                    last_visited: entry.last_visited,
                    repository: repository.to_view(),
                });
            }
        }

        let activity = ActivityRecord::recent_for_viewer(
            viewer_id,
            DASHBOARD_ACTIVITY_LIMIT,
            Utc::now(),
            db,
        )
        .await?
        .into_iter()
        .map(|record| ActivityItem {
            action: record.action.to_string(),
            details: record.details,
            timestamp: record.timestamp,
        })
        .collect();

        let stats = DashboardStats {
            active_repos: history.len(),
            token_usage_total: history
                .iter()
                .fold(0_u64, |sum, item| sum.saturating_add(item.repository.token_usage)),
        };

        Ok(Self {
            history,
            activity,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::storage::types::{activity_log::ActivityAction, repository::RepositoryUpdate};
    use uuid::Uuid;

    async fn setup_db() -> SurrealDbClient {
        let db = SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .expect("Failed to start in-memory surrealdb");
        db.ensure_initialized()
            .await
            .expect("Failed to initialize schema");
        db
    }

    async fn seed_repository(db: &SurrealDbClient, name: &str, tokens: u64) -> RepositoryRecord {
        RepositoryRecord::upsert(
            RepositoryUpdate {
                url: format!("https://github.com/acme/{name}"),
                name: name.into(),
                owner: "acme".into(),
                languages: BTreeMap::new(),
                architecture_map: format!("{name} summary"),
                last_commit_hash: "abc".into(),
                token_usage: tokens,
            },
            db,
        )
        .await
        .expect("seed repository")
    }

    #[tokio::test]
    async fn dashboard_joins_history_and_sums_tokens() {
        let db = setup_db().await;
        let one = seed_repository(&db, "one", 120).await;
        let two = seed_repository(&db, "two", 30).await;

        ViewerHistoryEntry::touch("viewer-1", &one.id, &db)
            .await
            .expect("touch one");
        ViewerHistoryEntry::touch("viewer-1", &two.id, &db)
            .await
            .expect("touch two");
        ViewerHistoryEntry::touch("viewer-1", "missing-repository", &db)
            .await
            .expect("touch missing");
        ActivityRecord::append("viewer-1", ActivityAction::Ingest, "Analyzed repository acme/one".into(), &db)
            .await
            .expect("activity");

        let dashboard = ViewerDashboard::load("viewer-1", &db)
            .await
            .expect("dashboard");

        let names: Vec<&str> = dashboard
            .history
            .iter()
            .map(|item| item.repository.name.as_str())
            .collect();
        assert_eq!(names, ["two", "one"]);
        assert_eq!(dashboard.stats.active_repos, 2);
        assert_eq!(dashboard.stats.token_usage_total, 150);
        assert_eq!(dashboard.activity.len(), 1);
        assert_eq!(
            dashboard.activity.first().map(|a| a.action.as_str()),
            Some("INGEST")
        );
    }

    #[tokio::test]
    async fn dashboard_for_unknown_viewer_is_empty() {
        let db = setup_db().await;
        let dashboard = ViewerDashboard::load("nobody", &db)
            .await
            .expect("dashboard");
        assert!(dashboard.history.is_empty());
        assert!(dashboard.activity.is_empty());
        assert_eq!(dashboard.stats, DashboardStats::default());
    }
}
