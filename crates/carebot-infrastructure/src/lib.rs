//! File-backed services: path resolution, `config.toml`, `secret.json`.

pub mod config_service;
pub mod paths;
pub mod secret_service;

pub use crate::config_service::{ConfigService, LoadedConfig};
pub use crate::paths::CarebotPaths;
pub use crate::secret_service::SecretServiceImpl;
