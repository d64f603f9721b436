//! Text-generation boundary.
//!
//! Defines the capability an assistant session uses to turn a rendered
//! prompt into a reply. Concrete HTTP clients live in `carebot-interaction`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling parameters forwarded to the generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

/// Classification of a failed generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    Network,
    /// The backend answered with a non-2xx status.
    HttpStatus(u16),
    /// The body did not contain `candidates[0].content.parts[0].text`.
    MalformedPayload,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ErrorKind::MalformedPayload => write!(f, "malformed payload"),
        }
    }
}

/// Error returned by a [`ResponseClient`].
///
/// Callers branch on [`ResponseError::kind`] only. The diagnostic string is
/// meant for logs and must never be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("generation failed ({kind}): {diagnostic}")]
pub struct ResponseError {
    kind: ErrorKind,
    diagnostic: String,
}

impl ResponseError {
    pub fn new(kind: ErrorKind, diagnostic: impl Into<String>) -> Self {
        Self {
            kind,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn network(diagnostic: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, diagnostic)
    }

    pub fn http_status(code: u16, diagnostic: impl Into<String>) -> Self {
        Self::new(ErrorKind::HttpStatus(code), diagnostic)
    }

    pub fn malformed(diagnostic: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedPayload, diagnostic)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }
}

/// Issues exactly one generation request per call.
///
/// Implementations must not retry and must map every failure onto a
/// [`ResponseError`]; raw transport errors do not cross this boundary.
#[async_trait::async_trait]
pub trait ResponseClient: Send + Sync {
    async fn send(&self, prompt: &str, params: &GenerationParams) -> Result<String, ResponseError>;
}
