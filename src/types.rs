//! Notification payloads delivered to the observer

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Snapshot of a running download, emitted once per chunk written to disk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressNotification {
    /// Whole percent transferred, `None` when the server did not declare a usable length
    pub percentage: Option<u8>,
    /// Resolved file name (Content-Disposition or last URL segment)
    pub file_name: String,
    /// Absolute path of the file being written
    pub destination_path: PathBuf,
    /// Bytes written to disk so far
    pub bytes_transferred: u64,
    /// Declared content length, if any
    pub total_bytes: Option<u64>,
}

impl ProgressNotification {
    /// Whether this snapshot is the completion signal (100%)
    pub fn is_complete(&self) -> bool {
        self.percentage == Some(100)
    }
}

/// Terminal outcome of an extraction run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Every entry was walked without a fault
    Success {
        /// Number of regular files written
        files: usize,
    },
    /// The walk stopped at the first fault
    Failure {
        /// Machine-readable error code
        code: String,
        /// Human-readable reason
        reason: String,
    },
}

impl Outcome {
    /// Whether the extraction succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Result of one extraction task; exactly one is emitted per task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultNotification {
    /// Archive that was extracted
    pub archive_path: PathBuf,
    /// Directory the entries were written under
    pub target_dir: PathBuf,
    /// Success or failure
    pub outcome: Outcome,
}

/// Event delivered through the notification channel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Download progress after a chunk was written
    Progress(ProgressNotification),

    /// Extraction finished
    Extraction(ResultNotification),

    /// Download failed (only emitted when `report_failures` is enabled)
    DownloadFailed {
        /// URL that was being downloaded
        url: String,
        /// Machine-readable error code
        code: String,
        /// Error message
        error: String,
    },
}

/// Kind of work a task handle refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// HTTP download
    Download,
    /// Zip extraction
    Extraction,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Download => write!(f, "download"),
            TaskKind::Extraction => write!(f, "extraction"),
        }
    }
}
