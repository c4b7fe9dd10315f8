//! Archive download record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveDownloadState {
    /// Frame loaded, no response yet
    Pending,
    /// Response body streaming to disk
    Downloading,
    /// Archive saved
    Completed,
    /// Request or write failed
    Failed,
    /// Frame cleared before the archive was saved
    Cancelled,
}

impl ArchiveDownloadState {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ArchiveDownloadState::Completed
                | ArchiveDownloadState::Failed
                | ArchiveDownloadState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveDownloadState::Pending => "pending",
            ArchiveDownloadState::Downloading => "downloading",
            ArchiveDownloadState::Completed => "completed",
            ArchiveDownloadState::Failed => "failed",
            ArchiveDownloadState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ArchiveDownloadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the archive frame fetched, or is fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveDownload {
    pub id: String,
    pub url: String,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub total_bytes: Option<u64>,
    pub downloaded_bytes: u64,
    pub state: ArchiveDownloadState,
    pub hash: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ArchiveDownload {
    pub fn new(url: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url,
            file_path: None,
            file_name: None,
            mime_type: None,
            total_bytes: None,
            downloaded_bytes: 0,
            state: ArchiveDownloadState::Pending,
            hash: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Get download progress as percentage (0-100)
    pub fn progress(&self) -> f64 {
        match self.total_bytes {
            Some(total) if total > 0 => {
                (self.downloaded_bytes as f64 / total as f64 * 100.0).min(100.0)
            }
            _ => 0.0,
        }
    }

    pub(crate) fn complete(&mut self, hash: Option<String>) {
        self.state = ArchiveDownloadState::Completed;
        self.hash = hash;
        self.completed_at = Some(Utc::now());
    }

    pub(crate) fn fail(&mut self, reason: String) {
        self.state = ArchiveDownloadState::Failed;
        self.error = Some(reason);
        self.completed_at = Some(Utc::now());
    }

    pub(crate) fn cancel(&mut self) {
        self.state = ArchiveDownloadState::Cancelled;
        self.completed_at = Some(Utc::now());
    }
}
