#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod changes;
pub mod diagram;
pub mod oracle;
pub mod pipeline;
pub mod progress;
pub mod prompt_branch;
pub mod ranking;
pub mod repo_url;
pub mod types;
pub mod utils;

pub use pipeline::{AnalysisConfig, AnalysisPipeline, AnalysisReport, AnalysisTuning};
pub use progress::{AnalysisResult, AnalysisUpdate, ProgressEvent, ProgressStatus};
pub use repo_url::RepoIdentity;
