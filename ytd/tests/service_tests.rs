use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};
use ytd::database;
use ytd::database::models::{TaskDbModel, TaskStatus};
use ytd::database::repositories::{SqlxTaskRepository, TaskRepository};
use ytd::downloader::{ProcessExit, ProcessOutput, ProcessRunner};
use ytd::scheduler::{TaskEvent, TaskRequest};
use ytd::services::ServiceContainer;
use ytd::{Error, Result};

/// Downloader stand-in that prints fixed progress and succeeds.
struct FakeDownloader;

#[async_trait]
impl ProcessRunner for FakeDownloader {
    fn program(&self) -> &str {
        "fake-dl"
    }

    async fn run(&self, _args: &[String]) -> Result<ProcessOutput> {
        let (line_tx, line_rx) = mpsc::channel(8);
        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(async move {
            for line in ["at:1MiB/s eta:00:02 per: 33.3%", "at:1MiB/s eta:00:00 per:100.0%"] {
                let _ = line_tx.send(line.to_string()).await;
            }
            drop(line_tx);
            let _ = exit_tx.send(ProcessExit { code: Some(0) });
        });
        Ok(ProcessOutput::from_parts(line_rx, exit_rx))
    }

    async fn capture(&self, args: &[String]) -> Result<Vec<u8>> {
        if args.iter().any(|a| a == "--get-filename") {
            return Ok(b"Clip.mp4\n".to_vec());
        }
        if args.iter().any(|a| a == "--dump-json") {
            return Ok(br#"{"id":"abc","title":"Clip","formats":[
                {"format_id":"18","ext":"mp4","vcodec":"avc1","acodec":"mp4a","format_note":"360p"}
            ]}"#
            .to_vec());
        }
        Err(Error::Other("unexpected call".into()))
    }
}

async fn open_pool(dir: &TempDir) -> database::DbPool {
    let db_url = format!(
        "sqlite:{}?mode=rwc",
        dir.path().join("ytd.db").to_string_lossy().replace('\\', "/")
    );
    let pool = database::init_pool(&db_url).await.unwrap();
    database::run_migrations(&pool).await.unwrap();
    pool
}

#[tokio::test]
async fn container_recovers_interrupted_tasks_on_startup() {
    let dir = TempDir::new().unwrap();
    let pool = open_pool(&dir).await;

    let repo = SqlxTaskRepository::new(pool.clone());
    repo.upsert_pending(&TaskDbModel::new("stale", "https://x/v", "", "", ""))
        .await
        .unwrap();
    repo.transition("stale", TaskStatus::Downloading, Some("stale.mp4"))
        .await
        .unwrap();

    let services = ServiceContainer::with_runner(pool, Arc::new(FakeDownloader))
        .await
        .unwrap();
    assert_eq!(
        services.scheduler.task("stale").await.unwrap().status(),
        TaskStatus::Error
    );
    services.shutdown().await;
}

#[tokio::test]
async fn resolve_then_download_end_to_end() {
    let dir = TempDir::new().unwrap();
    let services = ServiceContainer::with_runner(open_pool(&dir).await, Arc::new(FakeDownloader))
        .await
        .unwrap();

    let meta = services.resolver.resolve("abc").await.unwrap();
    let catalog = meta.processed_formats.unwrap();
    assert_eq!(catalog.len(), 1);

    let mut events = services.scheduler.subscribe();
    services
        .scheduler
        .submit(TaskRequest {
            id: "abc".into(),
            url: meta.requested_url.clone(),
            format_id: catalog[0].format_id.clone(),
            title: meta.title.unwrap_or_default(),
            thumbnail: String::new(),
        })
        .await
        .unwrap();
    services.scheduler.wait_idle().await;

    let mut percents = Vec::new();
    let mut last = None;
    while let Ok(event) = events.try_recv() {
        if let TaskEvent::Progress { sample, .. } = &event {
            percents.push(sample.percent.clone());
        }
        last = Some(event);
    }
    assert_eq!(percents, vec!["33.3", "100.0"]);
    assert_eq!(last, Some(TaskEvent::Completed { task_id: "abc".into() }));

    let history = services.history.list().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].file_path, "Clip.mp4");
    assert_eq!(history[0].format_id, "18");

    services.shutdown().await;
}
