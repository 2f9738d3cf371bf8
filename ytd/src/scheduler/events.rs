//! Scheduler events.

use serde::Serialize;

use crate::database::models::TaskStatus;
use crate::downloader::ProgressSample;

/// Why a task ended in `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureCause {
    /// The downloader could not be started.
    Launch(String),
    /// The downloader exited unsuccessfully. `None` when killed by a signal.
    Exit(Option<i32>),
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Launch(msg) => write!(f, "launch failed: {msg}"),
            Self::Exit(Some(code)) => write!(f, "exited with code {code}"),
            Self::Exit(None) => write!(f, "terminated by signal"),
        }
    }
}

/// Events emitted by the [`TaskScheduler`](super::TaskScheduler).
///
/// For one task they are always delivered in lifecycle order: `Started`,
/// zero or more `Progress`, then `Completed` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TaskEvent {
    Started {
        task_id: String,
        file_path: String,
    },
    Progress {
        task_id: String,
        #[serde(flatten)]
        sample: ProgressSample,
        status: TaskStatus,
    },
    Completed {
        task_id: String,
    },
    Failed {
        task_id: String,
        cause: FailureCause,
    },
}

impl TaskEvent {
    pub fn task_id(&self) -> &str {
        match self {
            Self::Started { task_id, .. }
            | Self::Progress { task_id, .. }
            | Self::Completed { task_id }
            | Self::Failed { task_id, .. } => task_id,
        }
    }

    /// Whether this is the last event of its task.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}
