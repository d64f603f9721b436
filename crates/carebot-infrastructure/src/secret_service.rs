//! Secret service implementation.
//!
//! This module provides a service for managing secret configuration (API keys)
//! stored in secret.json.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use carebot_core::config::{GeminiConfig, SecretConfig};
use carebot_core::error::{CareError, Result};
use carebot_core::secret::SecretService;

use crate::paths::CarebotPaths;

/// Service for managing secret configuration.
///
/// Reads `secret.json` once and caches the result. An explicit key override
/// (typically the `GEMINI_API_KEY` environment variable) wins over the file.
///
/// # Example
///
/// ```ignore
/// use carebot_infrastructure::{CarebotPaths, SecretServiceImpl};
/// use carebot_core::secret::SecretService;
///
/// let service = SecretServiceImpl::new(&CarebotPaths::default())?
///     .with_api_key_override(std::env::var("GEMINI_API_KEY").ok());
/// let secrets = service.load_secrets().await?;
/// ```
#[derive(Clone)]
pub struct SecretServiceImpl {
    path: PathBuf,
    api_key_override: Option<String>,
    /// Cached secret config loaded from storage.
    secrets: Arc<RwLock<Option<SecretConfig>>>,
}

impl SecretServiceImpl {
    pub fn new(paths: &CarebotPaths) -> Result<Self> {
        Ok(Self::with_path(paths.secret_file()?))
    }

    /// Creates a service reading from a specific file (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            api_key_override: None,
            secrets: Arc::new(RwLock::new(None)),
        }
    }

    /// Uses `key` instead of the file's key when it is present and non-blank.
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        self.api_key_override = key.filter(|k| !k.trim().is_empty());
        self
    }

    async fn read_file(&self) -> Result<SecretConfig> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No secret file found");
                return Ok(SecretConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        // serde_json errors can echo input; keep the file contents out of the message.
        serde_json::from_str(&content).map_err(|e| {
            CareError::config(format!(
                "Failed to parse secret file at {} (line {}, column {})",
                self.path.display(),
                e.line(),
                e.column()
            ))
        })
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig> {
        {
            let cached = self
                .secrets
                .read()
                .map_err(|_| CareError::internal("Secret cache lock poisoned"))?;
            if let Some(secrets) = cached.as_ref() {
                return Ok(secrets.clone());
            }
        }

        let mut loaded = self.read_file().await?;
        if let Some(key) = &self.api_key_override {
            loaded.gemini = Some(GeminiConfig {
                api_key: key.clone(),
            });
        }

        let mut cache = self
            .secrets
            .write()
            .map_err(|_| CareError::internal("Secret cache lock poisoned"))?;
        *cache = Some(loaded.clone());
        Ok(loaded)
    }

    async fn secret_file_exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}
