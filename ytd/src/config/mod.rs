//! Configuration module.
//!
//! Settings live as key/value rows in the store. They are loaded once into an
//! immutable [`Settings`] snapshot at startup and only change through
//! [`SettingsService::save`], which writes through to the store before the
//! snapshot is refreshed.

pub mod service;

pub use service::SettingsService;

use std::path::PathBuf;

use crate::{Error, Result};

/// Settings key for the download directory.
pub const DOWNLOAD_PATH_KEY: &str = "download_path";

/// Settings key for the admission gate capacity.
pub const MAX_CONCURRENT_KEY: &str = "max_concurrent";

/// Admission gate capacity used when no valid value is stored.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Largest accepted admission gate capacity.
pub const MAX_CONCURRENT_LIMIT: usize = 64;

/// Downloader binary used when `YTD_DOWNLOADER` is not set.
pub const DEFAULT_DOWNLOADER: &str = "yt-dlp";

/// Immutable snapshot of the persisted settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Download directory. Empty means the working directory.
    pub download_path: String,
    /// Maximum number of tasks downloading at once.
    pub max_concurrent: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_path: String::new(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl Settings {
    /// Build a snapshot from raw stored values.
    ///
    /// A `max_concurrent` that is missing, non-numeric or outside
    /// `1..=MAX_CONCURRENT_LIMIT` falls back to the default.
    pub fn from_values(download_path: Option<String>, max_concurrent: Option<String>) -> Self {
        let max_concurrent = max_concurrent
            .as_deref()
            .and_then(parse_max_concurrent)
            .unwrap_or(DEFAULT_MAX_CONCURRENT);

        Self {
            download_path: download_path.unwrap_or_default(),
            max_concurrent,
        }
    }

    /// Directory the downloader writes into, if one is configured.
    pub fn download_dir(&self) -> Option<PathBuf> {
        let trimmed = self.download_path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

/// Parse a stored `max_concurrent`, accepting only `1..=MAX_CONCURRENT_LIMIT`.
pub fn parse_max_concurrent(value: &str) -> Option<usize> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=MAX_CONCURRENT_LIMIT).contains(n))
}

/// Process-level configuration taken from the environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub database_url: String,
    pub downloader: String,
    pub log_dir: Option<PathBuf>,
}

impl EnvConfig {
    /// Read `DATABASE_URL`, `YTD_DOWNLOADER` and `YTD_LOG_DIR`, after loading
    /// an optional `.env` file.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let downloader = std::env::var("YTD_DOWNLOADER")
            .unwrap_or_else(|_| DEFAULT_DOWNLOADER.to_string());
        if downloader.trim().is_empty() {
            return Err(Error::config("YTD_DOWNLOADER is set but empty"));
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| crate::database::DEFAULT_DATABASE_URL.to_string()),
            downloader,
            log_dir: std::env::var_os("YTD_LOG_DIR").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_is_stored() {
        let settings = Settings::from_values(None, None);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.max_concurrent, 3);
        assert_eq!(settings.download_dir(), None);
    }

    #[test]
    fn test_invalid_max_concurrent_falls_back() {
        assert_eq!(Settings::from_values(None, Some("abc".into())).max_concurrent, 3);
        assert_eq!(Settings::from_values(None, Some("0".into())).max_concurrent, 3);
        assert_eq!(Settings::from_values(None, Some(" 5 ".into())).max_concurrent, 5);
    }

    #[test]
    fn test_oversized_max_concurrent_falls_back() {
        let huge = ((usize::MAX >> 3) + 1).to_string();
        assert_eq!(Settings::from_values(None, Some(huge)).max_concurrent, 3);
        assert_eq!(Settings::from_values(None, Some("65".into())).max_concurrent, 3);
        assert_eq!(Settings::from_values(None, Some("64".into())).max_concurrent, 64);
        assert_eq!(parse_max_concurrent("18446744073709551616"), None);
    }

    #[test]
    fn test_download_dir() {
        let settings = Settings::from_values(Some("/data/videos".into()), None);
        assert_eq!(settings.download_dir(), Some(PathBuf::from("/data/videos")));

        let blank = Settings::from_values(Some("   ".into()), None);
        assert_eq!(blank.download_dir(), None);
    }
}
