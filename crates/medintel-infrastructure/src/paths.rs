//! Path management for MedIntel configuration files.
//!
//! ```text
//! ~/.config/medintel/
//! └── config.toml      # Backend, conference and identity settings
//! ```

use std::path::PathBuf;

use medintel_core::error::{MedintelError, Result};

const APP_DIR: &str = "medintel";
const CONFIG_FILE: &str = "config.toml";

/// Resolves MedIntel's per-user directories.
pub struct MedintelPaths;

impl MedintelPaths {
    /// Returns the configuration directory (e.g. `~/.config/medintel/`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| MedintelError::config("Cannot find home directory"))
    }

    /// Returns the path of `config.toml`.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }
}
