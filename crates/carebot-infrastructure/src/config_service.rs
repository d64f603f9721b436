//! Loads `config.toml`.

use std::path::PathBuf;

use carebot_core::config::AppConfig;
use carebot_core::error::{CareError, Result};

use crate::paths::CarebotPaths;

/// A configuration and whether it came from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// `false` when the file was missing and defaults were used.
    pub from_file: bool,
}

/// Reads the application configuration file.
///
/// A missing file is not an error: every setting has a default.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(paths: &CarebotPaths) -> Result<Self> {
        Ok(Self {
            path: paths.config_file()?,
        })
    }

    /// Creates a service reading from a specific file (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Does not log: callers load configuration before logging is set up.
    pub async fn load(&self) -> Result<LoadedConfig> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedConfig {
                    config: AppConfig::default(),
                    from_file: false,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let config: AppConfig = toml::from_str(&content).map_err(|e| {
            CareError::config(format!(
                "Failed to parse configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(LoadedConfig {
            config,
            from_file: true,
        })
    }
}
