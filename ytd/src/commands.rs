use std::collections::HashSet;

use anyhow::{Context, bail};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use uuid::Uuid;

use ytd::config::{DOWNLOAD_PATH_KEY, MAX_CONCURRENT_KEY};
use ytd::database::models::TaskStatus;
use ytd::scheduler::{TaskEvent, TaskRequest};
use ytd::services::ServiceContainer;
use ytd::utils::url::normalize_video_url;

use crate::cli::{Commands, SettingsAction};

pub async fn execute(services: &ServiceContainer, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Info { url, json } => info(services, &url, json).await,
        Commands::Playlist { url, json } => playlist(services, &url, json).await,
        Commands::Download {
            urls,
            format_id,
            id,
            title,
            json,
        } => download(services, urls, format_id, id, title, json).await,
        Commands::History { json } => history(services, json).await,
        Commands::Delete { id, remove_file } => {
            services.history.delete(&id, remove_file).await?;
            println!("Deleted {id}");
            Ok(())
        }
        Commands::Settings { action } => settings(services, action).await,
    }
}

async fn info(services: &ServiceContainer, url: &str, json: bool) -> anyhow::Result<()> {
    let Some(meta) = services.resolver.resolve(url).await else {
        bail!("No details available for {url}");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
        return Ok(());
    }

    println!("{}", meta.title.as_deref().unwrap_or("(untitled)"));
    println!("{}", meta.requested_url);
    match meta.processed_formats.as_deref() {
        Some(catalog) if !catalog.is_empty() => {
            for entry in catalog {
                println!("  {}", entry.label);
            }
        }
        _ => println!("  no selectable formats"),
    }
    Ok(())
}

async fn playlist(services: &ServiceContainer, url: &str, json: bool) -> anyhow::Result<()> {
    let Some(entries) = services.resolver.resolve_list(url).await else {
        bail!("Could not read playlist {url}");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (i, entry) in entries.iter().enumerate() {
            println!("{:>3}. {}  {}", i + 1, entry.title, entry.url);
        }
    }
    Ok(())
}

async fn download(
    services: &ServiceContainer,
    urls: Vec<String>,
    format_id: String,
    id: Option<String>,
    title: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    if id.is_some() && urls.len() > 1 {
        bail!("--id can only be used with a single URL");
    }

    let scheduler = &services.scheduler;
    let mut events = scheduler.subscribe();
    let mut pending = HashSet::new();

    for url in urls {
        let (resolved_title, thumbnail) = match &title {
            Some(title) => (title.clone(), String::new()),
            None => match services.resolver.resolve(&url).await {
                Some(meta) => (
                    meta.title.unwrap_or_else(|| url.clone()),
                    meta.thumbnail.unwrap_or_default(),
                ),
                None => (url.clone(), String::new()),
            },
        };

        let request = TaskRequest {
            id: id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
            url: normalize_video_url(&url),
            format_id: format_id.clone(),
            title: resolved_title,
            thumbnail,
        };
        let task_id = request.id.clone();
        scheduler
            .submit(request)
            .await
            .with_context(|| format!("Failed to submit {url}"))?;
        pending.insert(task_id);
    }

    let mut failed = 0usize;
    while !pending.is_empty() {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event listener fell behind");
                failed += reconcile(services, &mut pending).await;
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        if !pending.contains(event.task_id()) {
            continue;
        }

        print_event(&event, json)?;
        match &event {
            TaskEvent::Completed { task_id } => {
                pending.remove(task_id);
            }
            TaskEvent::Failed { task_id, .. } => {
                failed += 1;
                pending.remove(task_id);
            }
            _ => {}
        }
    }

    scheduler.wait_idle().await;
    if failed > 0 {
        bail!("{failed} download(s) failed");
    }
    Ok(())
}

/// Drop finished tasks whose terminal event was missed. Returns how many failed.
async fn reconcile(services: &ServiceContainer, pending: &mut HashSet<String>) -> usize {
    let mut failed = 0;
    let finished: Vec<String> = pending
        .iter()
        .filter(|id| services.scheduler.active_status(id).is_none())
        .cloned()
        .collect();

    for id in finished {
        match services.scheduler.task(&id).await {
            Ok(task) if task.status() == TaskStatus::Completed => {}
            Ok(_) => failed += 1,
            Err(e) => {
                debug!(task_id = %id, error = %e, "Could not read finished task");
                failed += 1;
            }
        }
        pending.remove(&id);
    }
    failed
}

fn print_event(event: &TaskEvent, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        TaskEvent::Started { task_id, file_path } => {
            if file_path.is_empty() {
                println!("[{task_id}] started");
            } else {
                println!("[{task_id}] started -> {file_path}");
            }
        }
        TaskEvent::Progress {
            task_id, sample, ..
        } => println!(
            "[{task_id}] {:>6}%  {:>12}  eta {}",
            sample.percent, sample.speed, sample.eta
        ),
        TaskEvent::Completed { task_id } => println!("[{task_id}] completed"),
        TaskEvent::Failed { task_id, cause } => println!("[{task_id}] failed: {cause}"),
    }
    Ok(())
}

async fn history(services: &ServiceContainer, json: bool) -> anyhow::Result<()> {
    let tasks = services.history.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    } else if tasks.is_empty() {
        println!("No completed downloads");
    } else {
        for task in tasks {
            println!("{}  {}  {}", task.id, task.title, task.file_path);
        }
    }
    Ok(())
}

async fn settings(services: &ServiceContainer, action: SettingsAction) -> anyhow::Result<()> {
    match action {
        SettingsAction::Get { key: Some(key) } => match services.settings.get(&key).await? {
            Some(value) => println!("{value}"),
            None => bail!("{key} is not set"),
        },
        SettingsAction::Get { key: None } => {
            let current = services.settings.current();
            let download_path = if current.download_path.is_empty() {
                "(current directory)"
            } else {
                current.download_path.as_str()
            };
            println!("{DOWNLOAD_PATH_KEY} = {download_path}");
            println!("{MAX_CONCURRENT_KEY} = {}", current.max_concurrent);

            for setting in services.settings.list().await? {
                if setting.key != DOWNLOAD_PATH_KEY && setting.key != MAX_CONCURRENT_KEY {
                    println!("{} = {}", setting.key, setting.value);
                }
            }
        }
        SettingsAction::Set { key, value } => {
            services.settings.save(&key, &value).await?;
            println!("{key} = {value}");
            if key == MAX_CONCURRENT_KEY {
                println!("New concurrency limit applies from the next start");
            }
        }
    }
    Ok(())
}
