//! Application configuration types.
//!
//! `config.toml` holds non-secret settings; `secret.json` holds the API
//! credential. Loading lives in `carebot-infrastructure`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::persona::PersonaConfig;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Custom personas; an entry whose id matches a preset replaces it.
    #[serde(rename = "persona", default)]
    pub personas: Vec<PersonaConfig>,
}

/// Where and how generation requests are sent.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Base URL; the model path `/{model}:generateContent` is appended.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-request timeout. `0` disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GenerationSettings {
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.timeout_secs))
    }
}

/// Logging settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive (`RUST_LOG` takes precedence).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Root configuration structure for secret.json
#[derive(Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: String,
}

// Hand-written so the key never ends up in a log line.
impl fmt::Debug for SecretConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretConfig")
            .field("gemini", &self.gemini.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl SecretConfig {
    /// The Gemini API key, if one is configured and non-blank.
    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini
            .as_ref()
            .map(|g| g.api_key.trim())
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.generation.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.generation.model, DEFAULT_MODEL);
        assert_eq!(config.logging.level, "info");
        assert!(config.personas.is_empty());
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let settings = GenerationSettings {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(settings.timeout().is_none());
        assert_eq!(
            GenerationSettings::default().timeout(),
            Some(std::time::Duration::from_secs(30))
        );
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secrets = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: "AIza-very-secret".into(),
            }),
        };
        let printed = format!("{secrets:?}");
        assert!(!printed.contains("AIza"));
        assert_eq!(secrets.gemini_api_key(), Some("AIza-very-secret"));
    }

    #[test]
    fn test_blank_key_is_treated_as_missing() {
        let secrets: SecretConfig =
            serde_json::from_str(r#"{ "gemini": { "api_key": "   " } }"#).unwrap();
        assert_eq!(secrets.gemini_api_key(), None);
    }
}
