//! Wiring from configuration files to a [`SessionFactory`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use carebot_application::SessionFactory;
use carebot_core::config::AppConfig;
use carebot_core::secret::SecretService;
use carebot_core::speech::{NoSpeech, SpeechIo};
use carebot_core::user::{DefaultUserService, StaticUserService, UserService};
use carebot_infrastructure::{CarebotPaths, ConfigService, SecretServiceImpl};
use carebot_interaction::{GeminiApiClient, SystemSpeech, resolve_personas};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Resolved configuration for one invocation.
pub struct Bootstrap {
    pub paths: CarebotPaths,
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub config_from_file: bool,
}

impl Bootstrap {
    pub async fn load(config_dir: Option<&Path>) -> Result<Self> {
        let paths = CarebotPaths::new(config_dir);
        let config_service = ConfigService::new(&paths)?;
        let loaded = config_service
            .load()
            .await
            .with_context(|| format!("loading {}", config_service.path().display()))?;
        Ok(Self {
            paths,
            config: loaded.config,
            config_path: config_service.path().clone(),
            config_from_file: loaded.from_file,
        })
    }

    /// Reports where the configuration came from. Call once logging is up.
    pub fn log_config(&self) {
        if self.config_from_file {
            tracing::debug!(
                path = %self.config_path.display(),
                personas = self.config.personas.len(),
                level = %self.config.logging.level,
                "Loaded configuration"
            );
        } else {
            tracing::debug!(path = %self.config_path.display(), "No config file, using defaults");
        }
    }

    /// Builds the session factory for `chat`.
    pub async fn session_factory(&self, user_name: Option<String>, speech: bool) -> Result<SessionFactory> {
        let secret_service = SecretServiceImpl::new(&self.paths)?
            .with_api_key_override(std::env::var(API_KEY_ENV).ok());
        let secrets = secret_service.load_secrets().await?;

        let api_key = secrets.gemini_api_key().map(str::to_string);
        if api_key.is_none() {
            if secret_service.secret_file_exists().await {
                tracing::warn!("secret.json has no Gemini API key; requests go out unauthenticated");
            } else {
                tracing::warn!(
                    "No secret.json and no {API_KEY_ENV}; requests go out unauthenticated"
                );
            }
        }
        let client = GeminiApiClient::from_settings(&self.config.generation).with_api_key(api_key);
        tracing::info!(model = client.model(), "Generation client ready");

        let user_service: Arc<dyn UserService> = match user_name {
            Some(name) => Arc::new(StaticUserService::new(name)),
            None => Arc::new(DefaultUserService),
        };
        let speech: Arc<dyn SpeechIo> = if speech {
            Arc::new(SystemSpeech::probe())
        } else {
            Arc::new(NoSpeech)
        };

        Ok(SessionFactory::new(
            resolve_personas(&self.config.personas),
            user_service,
            Arc::new(client),
            speech,
        ))
    }
}
