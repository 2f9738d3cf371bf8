//! Download history.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::Result;
use crate::database::models::TaskDbModel;
use crate::database::repositories::TaskRepository;
use crate::utils::fs::remove_file_best_effort;

/// Completed downloads and their removal.
pub struct HistoryService {
    repo: Arc<dyn TaskRepository>,
}

impl HistoryService {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    /// Completed tasks ordered by id.
    pub async fn list(&self) -> Result<Vec<TaskDbModel>> {
        self.repo.list_completed().await
    }

    /// Delete a task row, optionally removing its downloaded file first.
    ///
    /// File removal is best effort: a missing or locked file does not keep
    /// the row from being deleted.
    pub async fn delete(&self, id: &str, remove_file: bool) -> Result<()> {
        if remove_file {
            let task = self.repo.get_task(id).await?;
            let removed = remove_file_best_effort(Path::new(&task.file_path)).await;
            info!(task_id = id, file_path = %task.file_path, removed, "Removing downloaded file");
        }

        self.repo.delete_task(id).await?;
        info!(task_id = id, "History entry deleted");
        Ok(())
    }
}
