//! Task scheduler implementation.
//!
//! Every submitted task runs as its own tokio task. Units are created
//! immediately and queue on a fixed-size semaphore, so submission never
//! blocks while at most `max_concurrent` tasks are downloading at once.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Semaphore, broadcast};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, trace, warn};

use super::events::{FailureCause, TaskEvent};
use crate::config::SettingsService;
use crate::database::models::{TaskDbModel, TaskStatus};
use crate::database::repositories::TaskRepository;
use crate::downloader::{ProcessRunner, parse_progress, ytdlp};
use crate::utils::fs::ensure_dir_all;
use crate::{Error, Result};

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A download request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRequest {
    pub id: String,
    pub url: String,
    /// Empty for best available.
    pub format_id: String,
    pub title: String,
    pub thumbnail: String,
}

/// Admission-controlled download scheduler.
pub struct TaskScheduler {
    max_concurrent: usize,
    gate: Arc<Semaphore>,
    /// Tasks submitted and not yet finished, with their in-memory status.
    active: Arc<DashMap<String, TaskStatus>>,
    event_tx: broadcast::Sender<TaskEvent>,
    tracker: TaskTracker,
    repo: Arc<dyn TaskRepository>,
    settings: Arc<SettingsService>,
    runner: Arc<dyn ProcessRunner>,
}

impl TaskScheduler {
    /// Build a scheduler. The gate capacity is taken from the current
    /// settings and stays fixed for the scheduler's lifetime.
    pub fn new(
        repo: Arc<dyn TaskRepository>,
        settings: Arc<SettingsService>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        let max_concurrent = settings.current().max_concurrent;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        info!(max_concurrent, downloader = runner.program(), "Task scheduler ready");

        Self {
            max_concurrent,
            gate: Arc::new(Semaphore::new(max_concurrent)),
            active: Arc::new(DashMap::new()),
            event_tx,
            tracker: TaskTracker::new(),
            repo,
            settings,
            runner,
        }
    }

    /// Record a Pending task and start its execution unit.
    ///
    /// Returns as soon as the task is recorded. Fails with
    /// [`Error::TaskActive`] if a task with the same id has not finished yet.
    /// Reusing the id of a finished task starts a fresh run.
    pub async fn submit(&self, request: TaskRequest) -> Result<()> {
        if request.id.trim().is_empty() {
            return Err(Error::validation("task id must not be empty"));
        }
        if request.url.trim().is_empty() {
            return Err(Error::validation("task url must not be empty"));
        }

        match self.active.entry(request.id.clone()) {
            Entry::Occupied(_) => return Err(Error::TaskActive(request.id)),
            Entry::Vacant(slot) => {
                slot.insert(TaskStatus::Pending);
            }
        }

        let task = TaskDbModel::new(
            &request.id,
            &request.url,
            &request.format_id,
            &request.title,
            &request.thumbnail,
        );
        if let Err(e) = self.repo.upsert_pending(&task).await {
            warn!(task_id = %request.id, error = %e, "Failed to record pending task");
        }

        debug!(task_id = %request.id, url = %request.url, "Task submitted");

        let unit = TaskUnit {
            gate: self.gate.clone(),
            active: self.active.clone(),
            event_tx: self.event_tx.clone(),
            repo: self.repo.clone(),
            settings: self.settings.clone(),
            runner: self.runner.clone(),
        };
        self.tracker.spawn(unit.run(request));
        Ok(())
    }

    /// Subscribe to task events.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.event_tx.subscribe()
    }

    /// Wait until every submitted task has finished.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Number of submitted tasks that have not finished.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of admission slots currently held.
    pub fn slots_in_use(&self) -> usize {
        self.max_concurrent - self.gate.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// In-memory status of an unfinished task.
    pub fn active_status(&self, id: &str) -> Option<TaskStatus> {
        self.active.get(id).map(|s| *s)
    }

    pub async fn task(&self, id: &str) -> Result<TaskDbModel> {
        self.repo.get_task(id).await
    }

    pub async fn tasks(&self) -> Result<Vec<TaskDbModel>> {
        self.repo.list_tasks().await
    }
}

/// Everything one execution unit needs, detached from the scheduler.
struct TaskUnit {
    gate: Arc<Semaphore>,
    active: Arc<DashMap<String, TaskStatus>>,
    event_tx: broadcast::Sender<TaskEvent>,
    repo: Arc<dyn TaskRepository>,
    settings: Arc<SettingsService>,
    runner: Arc<dyn ProcessRunner>,
}

impl TaskUnit {
    async fn run(self, request: TaskRequest) {
        let task_id = request.id.clone();

        let permit = match self.gate.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(task_id = %task_id, error = %e, "Admission gate closed");
                self.active.remove(&task_id);
                return;
            }
        };
        debug!(task_id = %task_id, "Admitted");

        let settings = self.settings.current();
        let download_dir = settings.download_dir();
        if let Some(dir) = &download_dir
            && let Err(e) = ensure_dir_all(dir).await
        {
            warn!(task_id = %task_id, error = %e, "Could not create download directory");
        }
        let template = ytdlp::output_template(download_dir.as_deref());

        let file_path = self.resolve_filename(&template, &request).await;
        self.persist(&task_id, TaskStatus::Downloading, Some(&file_path))
            .await;
        self.active.insert(task_id.clone(), TaskStatus::Downloading);
        info!(task_id = %task_id, file_path = %file_path, "Download started");
        self.emit(TaskEvent::Started {
            task_id: task_id.clone(),
            file_path,
        });

        match self.download(&template, &request).await {
            Ok(()) => {
                self.persist(&task_id, TaskStatus::Completed, None).await;
                info!(task_id = %task_id, "Download completed");
                self.emit(TaskEvent::Completed {
                    task_id: task_id.clone(),
                });
            }
            Err(cause) => {
                self.persist(&task_id, TaskStatus::Error, None).await;
                warn!(task_id = %task_id, %cause, "Download failed");
                self.emit(TaskEvent::Failed {
                    task_id: task_id.clone(),
                    cause,
                });
            }
        }

        self.active.remove(&task_id);
        drop(permit);
    }

    /// Ask the downloader for the final output path. Empty when it cannot tell.
    async fn resolve_filename(&self, template: &str, request: &TaskRequest) -> String {
        let args = ytdlp::filename_args(template, &request.format_id, &request.url);
        match self.runner.capture(&args).await {
            Ok(stdout) => String::from_utf8_lossy(&stdout)
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or_default()
                .to_string(),
            Err(e) => {
                warn!(task_id = %request.id, error = %e, "Could not resolve output filename");
                String::new()
            }
        }
    }

    /// Run the download, forwarding progress as it is printed.
    async fn download(
        &self,
        template: &str,
        request: &TaskRequest,
    ) -> std::result::Result<(), FailureCause> {
        let args = ytdlp::download_args(template, &request.format_id, &request.url);
        let mut output = self
            .runner
            .run(&args)
            .await
            .map_err(|e| FailureCause::Launch(e.to_string()))?;

        while let Some(line) = output.next_line().await {
            trace!(task_id = %request.id, %line, "Downloader output");
            if let Some(sample) = parse_progress(&line) {
                self.emit(TaskEvent::Progress {
                    task_id: request.id.clone(),
                    sample,
                    status: TaskStatus::Downloading,
                });
            }
        }

        let exit = output.wait().await;
        if exit.success() {
            Ok(())
        } else {
            Err(FailureCause::Exit(exit.code))
        }
    }

    async fn persist(&self, task_id: &str, status: TaskStatus, file_path: Option<&str>) {
        if let Err(e) = self.repo.transition(task_id, status, file_path).await {
            warn!(task_id, %status, error = %e, "Failed to persist task status");
        }
    }

    fn emit(&self, event: TaskEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}
