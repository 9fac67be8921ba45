use common::{error::AppError, storage::types::repository::RepositoryView};
use serde::Serialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Connecting,
    Fetching,
    Found,
    Ranking,
    Analyzing,
    Saving,
    Complete,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub message: String,
}

/// Terminal record of a run: exactly one per run, always last.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RepositoryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn success(data: RepositoryView) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn from_error(err: &AppError) -> Self {
        Self::failure(err.public_message())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AnalysisUpdate {
    Progress(ProgressEvent),
    Finished(AnalysisResult),
}

impl AnalysisUpdate {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisUpdate::Finished(_))
    }
}

/// Fire-and-forget progress channel. Emitting never blocks the run, and a dropped
/// receiver is not an error.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<UnboundedSender<AnalysisUpdate>>,
}

impl ProgressSink {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn channel() -> (Self, UnboundedReceiver<AnalysisUpdate>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn emit(&self, status: ProgressStatus, message: impl Into<String>) {
        self.send(AnalysisUpdate::Progress(ProgressEvent {
            status,
            message: message.into(),
        }));
    }

    pub fn finish(&self, result: AnalysisResult) {
        self.send(AnalysisUpdate::Finished(result));
    }

    fn send(&self, update: AnalysisUpdate) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(update);
        }
    }
}
