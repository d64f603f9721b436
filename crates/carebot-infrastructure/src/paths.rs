//! Unified path management for carebot configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/carebot/           # Config directory (dirs::config_dir)
//! ├── config.toml              # Endpoint, model, logging, custom personas
//! └── secret.json              # API keys
//! ```

use std::path::{Path, PathBuf};

use carebot_core::error::{CareError, Result};

const APP_DIR: &str = "carebot";
const CONFIG_FILE: &str = "config.toml";
const SECRET_FILE: &str = "secret.json";

/// Resolves carebot file locations.
///
/// A custom base directory replaces the platform config directory entirely,
/// which is what tests and the CLI `--config-dir` flag use.
#[derive(Debug, Clone)]
pub struct CarebotPaths {
    base: Option<PathBuf>,
}

impl CarebotPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the carebot configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/carebot/`)
    /// - `Err(CareError::Config)`: Could not determine directory
    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| CareError::config("Cannot find config directory"))
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(CONFIG_FILE))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(SECRET_FILE))
    }
}

impl Default for CarebotPaths {
    fn default() -> Self {
        Self::new(None)
    }
}
