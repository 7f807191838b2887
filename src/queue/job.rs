use crate::config::CrawlConfiguration;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a crawl job
///
/// A job is created `Pending`, claimed into `Active`, and reaches exactly
/// one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn to_db_string(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// The wording used by the status interface
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Active => "processing",
            other => other.to_db_string(),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Latest progress event for a job, overwritten on every push
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub stage: String,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub current_url: Option<String>,
    pub percent: u8,
}

/// One queued crawl job
#[derive(Debug, Clone)]
pub struct CrawlJob {
    pub id: i64,
    pub target_url: String,
    pub output_base_url: String,
    pub configuration: CrawlConfiguration,
    pub status: JobStatus,
    pub progress: Option<ProgressSnapshot>,
    pub error_message: Option<String>,
    pub manifest_url: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}
