//! Service container.
//!
//! Wires the store, settings, downloader and scheduler together.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::history::HistoryService;
use crate::Result;
use crate::config::SettingsService;
use crate::database::repositories::{SqlxSettingsRepository, SqlxTaskRepository, TaskRepository};
use crate::downloader::{CommandRunner, ProcessRunner};
use crate::metadata::MetadataResolver;
use crate::scheduler::TaskScheduler;

/// Holds every application service.
pub struct ServiceContainer {
    pub pool: SqlitePool,
    pub settings: Arc<SettingsService>,
    pub resolver: Arc<MetadataResolver>,
    pub scheduler: Arc<TaskScheduler>,
    pub history: Arc<HistoryService>,
}

impl ServiceContainer {
    /// Build the services around the given downloader binary.
    pub async fn new(pool: SqlitePool, downloader: &str) -> Result<Self> {
        Self::with_runner(pool, Arc::new(CommandRunner::new(downloader))).await
    }

    /// Build the services around any process runner.
    ///
    /// Tasks left `Downloading` by a previous process are marked `Error`
    /// before the scheduler starts.
    pub async fn with_runner(pool: SqlitePool, runner: Arc<dyn ProcessRunner>) -> Result<Self> {
        let task_repo: Arc<dyn TaskRepository> = Arc::new(SqlxTaskRepository::new(pool.clone()));
        let settings_repo = Arc::new(SqlxSettingsRepository::new(pool.clone()));

        let interrupted = task_repo.mark_interrupted().await?;
        if interrupted > 0 {
            warn!(count = interrupted, "Marked interrupted downloads as failed");
        }

        let settings = Arc::new(SettingsService::load(settings_repo).await?);
        let resolver = Arc::new(MetadataResolver::new(runner.clone()));
        let scheduler = Arc::new(TaskScheduler::new(
            task_repo.clone(),
            settings.clone(),
            runner,
        ));
        let history = Arc::new(HistoryService::new(task_repo));

        info!("Services initialized");
        Ok(Self {
            pool,
            settings,
            resolver,
            scheduler,
            history,
        })
    }

    /// Wait for in-flight downloads, then close the pool.
    pub async fn shutdown(&self) {
        let active = self.scheduler.active_count();
        if active > 0 {
            info!(active, "Waiting for downloads to finish");
        }
        self.scheduler.wait_idle().await;
        self.pool.close().await;
        info!("Shutdown complete");
    }
}
