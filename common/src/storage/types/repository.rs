#![allow(clippy::module_name_repetitions)]
use std::collections::BTreeMap;

use crate::{
    error::AppError,
    storage::db::{retry_on_conflict, SurrealDbClient},
    stored_object,
};

use super::deterministic_id;

const UPSERT_REPOSITORY: &str = r"
    UPSERT type::thing('repository', $id) SET
        url = $url,
        name = $name,
        owner = $owner,
        languages = $languages,
        architecture_map = $architecture_map,
        status = $status,
        last_analyzed = $now,
        last_commit_hash = $last_commit_hash,
        token_usage = (token_usage OR 0) + $token_usage,
        created_at = (created_at OR $now),
        updated_at = $now
    RETURN AFTER;
";

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Completed,
}

stored_object!(RepositoryRecord, "repository", {
    url: String,
    name: String,
    owner: String,
    #[serde(default)]
    languages: BTreeMap<String, u64>,
    #[serde(default)]
    architecture_map: String,
    #[serde(default)]
    status: AnalysisStatus,
    #[serde(
        serialize_with = "serialize_option_datetime",
        deserialize_with = "deserialize_option_datetime",
        default
    )]
    last_analyzed: Option<DateTime<Utc>>,
    #[serde(default)]
    last_commit_hash: Option<String>,
    #[serde(default)]
    token_usage: u64
});

/// Fields written by one completed analysis.
#[derive(Debug, Clone)]
pub struct RepositoryUpdate {
    pub url: String,
    pub name: String,
    pub owner: String,
    pub languages: BTreeMap<String, u64>,
    pub architecture_map: String,
    pub last_commit_hash: String,
    pub token_usage: u64,
}

/// Shape handed to downstream collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryView {
    pub id: String,
    pub url: String,
    pub name: String,
    pub owner: String,
    pub languages: BTreeMap<String, u64>,
    pub architecture_map: String,
    pub status: AnalysisStatus,
    pub last_analyzed: Option<DateTime<Utc>>,
    pub last_commit_hash: Option<String>,
    pub token_usage: u64,
    pub updated_at: DateTime<Utc>,
}

impl RepositoryRecord {
    pub fn id_for_url(canonical_url: &str) -> String {
        deterministic_id(&[canonical_url])
    }

    pub async fn find_by_url(
        canonical_url: &str,
        db: &SurrealDbClient,
    ) -> Result<Option<Self>, AppError> {
        Ok(db.get_item(&Self::id_for_url(canonical_url)).await?)
    }

    /// Atomic find-or-create-and-update keyed on the canonical URL. Token usage accumulates;
    /// every other field is replaced by the latest analysis.
    pub async fn upsert(update: RepositoryUpdate, db: &SurrealDbClient) -> Result<Self, AppError> {
        let id = Self::id_for_url(&update.url);

        let stored: Option<Self> = retry_on_conflict(|| {
            let update = update.clone();
            let id = id.clone();
            async move {
                db.client
                    .query(UPSERT_REPOSITORY)
                    .bind(("id", id))
                    .bind(("url", update.url))
                    .bind(("name", update.name))
                    .bind(("owner", update.owner))
                    .bind(("languages", update.languages))
                    .bind(("architecture_map", update.architecture_map))
                    .bind(("status", AnalysisStatus::Completed))
                    .bind(("now", surrealdb::sql::Datetime::from(Utc::now())))
                    .bind(("last_commit_hash", update.last_commit_hash))
                    .bind(("token_usage", update.token_usage))
                    .await?
                    .take(0)
            }
        })
        .await?;

        stored.ok_or_else(|| AppError::InternalError("repository upsert returned no record".into()))
    }

    pub async fn recent(limit: usize, db: &SurrealDbClient) -> Result<Vec<Self>, AppError> {
        let repositories: Vec<Self> = db
            .client
            .query("SELECT * FROM type::table($table) ORDER BY updated_at DESC LIMIT $limit")
            .bind(("table", Self::table_name()))
            .bind(("limit", limit))
            .await?
            .take(0)?;

        Ok(repositories)
    }

    /// A completed record whose content-identity hash matches needs no regeneration.
    pub fn is_current(&self, content_hash: &str) -> bool {
        self.status == AnalysisStatus::Completed
            && self.last_commit_hash.as_deref() == Some(content_hash)
    }

    /// Artifact text framed as conversational context for the chat collaborator.
    pub fn chat_context(&self) -> String {
        format!(
            "You are answering questions about the repository {owner}/{name} ({url}).\n\
             Use the following architecture summary as your primary source of truth.\n\n\
             {summary}",
            owner = self.owner,
            name = self.name,
            url = self.url,
            summary = self.architecture_map
        )
    }

    pub fn to_view(&self) -> RepositoryView {
        RepositoryView {
            id: self.id.clone(),
            url: self.url.clone(),
            name: self.name.clone(),
            owner: self.owner.clone(),
            languages: self.languages.clone(),
            architecture_map: self.architecture_map.clone(),
            status: self.status,
            last_analyzed: self.last_analyzed,
            last_commit_hash: self.last_commit_hash.clone(),
            token_usage: self.token_usage,
            updated_at: self.updated_at,
        }
    }
}
