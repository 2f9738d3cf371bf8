mod cli;
mod commands;

use clap::Parser;
use tracing::debug;

use ytd::config::EnvConfig;
use ytd::database;
use ytd::logging::{Verbosity, init_logging};
use ytd::services::ServiceContainer;

use crate::cli::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loads .env before anything reads the environment.
    let env = EnvConfig::from_env()?;
    let args = Args::parse();

    let log_dir = args.log_dir.clone().or(env.log_dir);
    let _guard = init_logging(
        Verbosity::from_flags(args.verbose, args.quiet),
        log_dir.as_deref(),
    )?;

    let database_url = args.database_url.unwrap_or(env.database_url);
    let downloader = args.downloader.unwrap_or(env.downloader);
    debug!(%database_url, %downloader, "Starting");

    let pool = database::init_pool(&database_url).await?;
    database::run_migrations(&pool).await?;

    let services = ServiceContainer::new(pool, &downloader).await?;
    let result = commands::execute(&services, args.command).await;
    services.shutdown().await;
    result
}
