//! ytd: a concurrent media download orchestrator driving `yt-dlp`.
//!
//! Tasks are admitted through a bounded [`scheduler::TaskScheduler`], each
//! running the downloader as a subprocess whose merged output is parsed into
//! progress events. Task state and settings persist in SQLite.

pub mod config;
pub mod database;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod scheduler;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
