//! Task database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Task database model.
/// One row per user-requested download job, keyed by a caller-supplied id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskDbModel {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Requested format id, empty for best available
    pub format_id: String,
    pub thumbnail: String,
    /// Output path reported by the downloader, empty until resolved
    pub file_path: String,
    /// Status: Pending, Downloading, Completed, Error
    pub status: String,
    /// RFC 3339 timestamp when the row was first created
    pub created_at: String,
    /// RFC 3339 timestamp of the last write
    pub updated_at: String,
}

impl TaskDbModel {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        format_id: impl Into<String>,
        title: impl Into<String>,
        thumbnail: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            format_id: format_id.into(),
            thumbnail: thumbnail.into(),
            file_path: String::new(),
            status: TaskStatus::Pending.as_str().to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Parsed status. Unknown values are treated as `Error`.
    pub fn status(&self) -> TaskStatus {
        TaskStatus::parse(&self.status).unwrap_or(TaskStatus::Error)
    }
}

/// Task lifecycle status.
///
/// Transitions only move forward: `Pending -> Downloading -> {Completed, Error}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum TaskStatus {
    /// Recorded, waiting for an admission slot.
    Pending,
    /// Holding a slot; the downloader is running.
    Downloading,
    /// Downloader exited successfully.
    Completed,
    /// Downloader failed to start or exited non-zero.
    Error,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Downloading => "Downloading",
            Self::Completed => "Completed",
            Self::Error => "Error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(Self::Pending),
            "Downloading" => Some(Self::Downloading),
            "Completed" => Some(Self::Completed),
            "Error" => Some(Self::Error),
            _ => None,
        }
    }

    /// The only status a task may be in right before entering `self`.
    pub fn predecessor(&self) -> Option<Self> {
        match self {
            Self::Pending => None,
            Self::Downloading => Some(Self::Pending),
            Self::Completed | Self::Error => Some(Self::Downloading),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trips_through_strings() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Downloading,
            TaskStatus::Completed,
            TaskStatus::Error,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
            assert_eq!(status.to_string(), status.as_str());
            assert_eq!(TaskStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert_eq!(TaskStatus::parse("Paused"), None);
    }

    #[test]
    fn test_transitions_only_move_forward() {
        use TaskStatus::*;
        assert_eq!(Pending.predecessor(), None);
        assert_eq!(Downloading.predecessor(), Some(Pending));
        assert_eq!(Completed.predecessor(), Some(Downloading));
        assert_eq!(Error.predecessor(), Some(Downloading));
    }

    #[test]
    fn test_new_task_is_pending() {
        let task = TaskDbModel::new("t1", "https://example.com/v", "", "Title", "");
        assert_eq!(task.status(), TaskStatus::Pending);
        assert!(task.file_path.is_empty());
        assert_eq!(task.created_at, task.updated_at);
    }
}
