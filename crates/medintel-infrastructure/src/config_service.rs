//! Configuration service implementation.
//!
//! Loads [`MedintelConfig`] from `~/.config/medintel/config.toml` and applies
//! environment overrides on top.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use medintel_core::config::MedintelConfig;
use medintel_core::error::{MedintelError, Result};

use crate::paths::MedintelPaths;

pub const ENV_BACKEND_URL: &str = "MEDINTEL_BACKEND_URL";
pub const ENV_CONFERENCE_DOMAIN: &str = "MEDINTEL_CONFERENCE_DOMAIN";
pub const ENV_DOCTOR_ID: &str = "MEDINTEL_DOCTOR_ID";

/// Configuration service that loads and caches the root configuration.
///
/// A missing file is not an error: defaults are used. A file that exists but
/// does not parse is reported by [`load`](Self::load).
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<MedintelConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the per-user config file.
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service reading an explicit file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// Falls back to defaults (with environment overrides) if the file is
    /// unreadable; the failure is logged.
    pub fn get_config(&self) -> MedintelConfig {
        if let Some(cached) = self.cached() {
            return cached;
        }

        let loaded = self.load().unwrap_or_else(|e| {
            tracing::warn!("[ConfigService] Using default configuration: {}", e);
            apply_overrides(MedintelConfig::default(), |key| env::var(key).ok())
        });

        self.store(loaded.clone());
        loaded
    }

    /// Reads the file and applies environment overrides, bypassing the cache.
    pub fn load(&self) -> Result<MedintelConfig> {
        let path = self.config_path()?;
        let config = read_config_file(&path)?;
        Ok(apply_overrides(config, |key| env::var(key).ok()))
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *write_lock = None;
    }

    /// Path the service reads from.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => MedintelPaths::config_file(),
        }
    }

    fn cached(&self) -> Option<MedintelConfig> {
        let read_lock = self
            .config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        read_lock.clone()
    }

    fn store(&self, config: MedintelConfig) {
        let mut write_lock = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *write_lock = Some(config);
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

fn read_config_file(path: &Path) -> Result<MedintelConfig> {
    if !path.exists() {
        tracing::debug!(
            "[ConfigService] No config file at {}, using defaults",
            path.display()
        );
        return Ok(MedintelConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        MedintelError::io(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let config: MedintelConfig = toml::from_str(&content)?;
    tracing::info!("[ConfigService] Loaded configuration from {}", path.display());
    Ok(config)
}

/// Applies `MEDINTEL_*` overrides using `lookup` to read variables.
pub fn apply_overrides<F>(mut config: MedintelConfig, lookup: F) -> MedintelConfig
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_empty(ENV_BACKEND_URL) {
        config.backend.base_url = url;
    }
    if let Some(domain) = non_empty(ENV_CONFERENCE_DOMAIN) {
        config.conference.domain = domain;
    }
    if let Some(doctor_id) = non_empty(ENV_DOCTOR_ID) {
        config.identity.fallback_doctor_id = Some(doctor_id);
    }

    config
}
