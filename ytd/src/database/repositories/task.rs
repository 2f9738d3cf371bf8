//! Task repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::{TaskDbModel, TaskStatus};
use crate::{Error, Result};

/// Task repository trait.
///
/// Each task unit only ever writes its own row, so every operation here is a
/// single statement and needs no cross-row transaction.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a Pending task, or reset an existing row with the same id to
    /// Pending. The historical `file_path` of an existing row is kept.
    async fn upsert_pending(&self, task: &TaskDbModel) -> Result<()>;

    /// Move a task to `to`, optionally recording its output path.
    ///
    /// Fails with `InvalidStateTransition` when the row is not currently in
    /// the predecessor state of `to`.
    async fn transition(&self, id: &str, to: TaskStatus, file_path: Option<&str>) -> Result<()>;

    async fn get_task(&self, id: &str) -> Result<TaskDbModel>;
    async fn list_tasks(&self) -> Result<Vec<TaskDbModel>>;

    /// Completed tasks ordered by id.
    async fn list_completed(&self) -> Result<Vec<TaskDbModel>>;

    async fn delete_task(&self, id: &str) -> Result<()>;

    /// Mark rows left `Downloading` by a previous process as `Error`.
    async fn mark_interrupted(&self) -> Result<u64>;
}

/// SQLx implementation of TaskRepository.
pub struct SqlxTaskRepository {
    pool: SqlitePool,
}

impl SqlxTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqlxTaskRepository {
    async fn upsert_pending(&self, task: &TaskDbModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, title, url, format_id, thumbnail, file_path, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                url = excluded.url,
                format_id = excluded.format_id,
                thumbnail = excluded.thumbnail,
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.url)
        .bind(&task.format_id)
        .bind(&task.thumbnail)
        .bind(&task.file_path)
        .bind(TaskStatus::Pending.as_str())
        .bind(&task.created_at)
        .bind(&task.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn transition(&self, id: &str, to: TaskStatus, file_path: Option<&str>) -> Result<()> {
        let Some(from) = to.predecessor() else {
            return Err(Error::validation(format!(
                "task {id} can only enter {to} through submission"
            )));
        };

        let result = sqlx::query(
            r#"
            UPDATE tasks SET
                status = ?,
                file_path = COALESCE(?, file_path),
                updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to.as_str())
        .bind(file_path)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_task(id).await?;
            return Err(Error::InvalidStateTransition {
                from: current.status,
                to: to.to_string(),
            });
        }
        Ok(())
    }

    async fn get_task(&self, id: &str) -> Result<TaskDbModel> {
        sqlx::query_as::<_, TaskDbModel>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("Task", id))
    }

    async fn list_tasks(&self) -> Result<Vec<TaskDbModel>> {
        let tasks = sqlx::query_as::<_, TaskDbModel>("SELECT * FROM tasks ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn list_completed(&self) -> Result<Vec<TaskDbModel>> {
        let tasks =
            sqlx::query_as::<_, TaskDbModel>("SELECT * FROM tasks WHERE status = ? ORDER BY id")
                .bind(TaskStatus::Completed.as_str())
                .fetch_all(&self.pool)
                .await?;
        Ok(tasks)
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("Task", id));
        }
        Ok(())
    }

    async fn mark_interrupted(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE status = ?")
            .bind(TaskStatus::Error.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(TaskStatus::Downloading.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
