//! Settings service.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::{
    DOWNLOAD_PATH_KEY, MAX_CONCURRENT_KEY, MAX_CONCURRENT_LIMIT, Settings, parse_max_concurrent,
};
use crate::{Error, Result};
use crate::database::models::SettingDbModel;
use crate::database::repositories::SettingsRepository;

/// Owns the settings snapshot and the store behind it.
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
    snapshot: RwLock<Arc<Settings>>,
}

impl SettingsService {
    /// Load the settings snapshot from the store.
    pub async fn load(repo: Arc<dyn SettingsRepository>) -> Result<Self> {
        let settings = Self::read(repo.as_ref()).await?;
        info!(
            download_path = %settings.download_path,
            max_concurrent = settings.max_concurrent,
            "Settings loaded"
        );
        Ok(Self {
            repo,
            snapshot: RwLock::new(Arc::new(settings)),
        })
    }

    async fn read(repo: &dyn SettingsRepository) -> Result<Settings> {
        let download_path = repo.get_setting(DOWNLOAD_PATH_KEY).await?;
        let max_concurrent = repo.get_setting(MAX_CONCURRENT_KEY).await?;
        Ok(Settings::from_values(download_path, max_concurrent))
    }

    /// Current snapshot.
    pub fn current(&self) -> Arc<Settings> {
        self.snapshot.read().clone()
    }

    /// Raw stored value for any key.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.repo.get_setting(key).await
    }

    pub async fn list(&self) -> Result<Vec<SettingDbModel>> {
        self.repo.list_settings().await
    }

    /// Persist a value and refresh the snapshot.
    ///
    /// A new `max_concurrent` only applies to schedulers built afterwards.
    pub async fn save(&self, key: &str, value: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::validation("setting key must not be empty"));
        }
        if key == MAX_CONCURRENT_KEY && parse_max_concurrent(value).is_none() {
            return Err(Error::validation(format!(
                "{MAX_CONCURRENT_KEY} must be between 1 and {MAX_CONCURRENT_LIMIT}, got {value:?}"
            )));
        }

        self.repo.set_setting(key, value).await?;
        let settings = Self::read(self.repo.as_ref()).await?;
        *self.snapshot.write() = Arc::new(settings);
        debug!(key, value, "Setting saved");
        Ok(())
    }
}
