//! Credential loading boundary.

use crate::config::SecretConfig;
use crate::error::Result;

/// Source of the generation API credential.
///
/// The credential lives with the process that talks to the generation
/// backend. It never enters a prompt, a transcript, a log line or an error
/// message.
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    /// Loads the secret configuration.
    ///
    /// A missing secret file yields an empty configuration; proxy
    /// deployments hold the key elsewhere.
    async fn load_secrets(&self) -> Result<SecretConfig>;

    async fn secret_file_exists(&self) -> bool;
}
