//! GeminiApiClient - Direct REST API implementation for Gemini.
//!
//! Sends one `generateContent` request per user turn. The API key, when
//! present, travels in the `x-goog-api-key` header and is held by the
//! process running this client; deployments that front the API with a
//! key-holding proxy construct the client without a key.

use std::time::Duration;

use async_trait::async_trait;
use carebot_core::config::GenerationSettings;
use carebot_core::generation::{GenerationParams, ResponseClient, ResponseError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// [`ResponseClient`] that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiApiClient {
    /// Creates a client for `{endpoint}/{model}:generateContent`.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            timeout: None,
        }
    }

    /// Creates a client from the `[generation]` section of `config.toml`.
    pub fn from_settings(settings: &GenerationSettings) -> Self {
        Self::new(settings.endpoint.clone(), settings.model.clone()).with_timeout(settings.timeout())
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

impl std::fmt::Debug for GeminiApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiApiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl ResponseClient for GeminiApiClient {
    async fn send(&self, prompt: &str, params: &GenerationParams) -> Result<String, ResponseError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig::from(params),
        };

        let mut request = self.client.post(self.url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Sending Gemini request");

        let response = request
            .send()
            .await
            .map_err(|err| ResponseError::network(format!("Gemini API request failed: {err}")))?;

        let status = response.status();
        let body_text = response.text().await.map_err(|err| {
            ResponseError::network(format!("Failed to read Gemini response body: {err}"))
        })?;

        if !status.is_success() {
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body_text)
            .map_err(|err| ResponseError::malformed(format!("Failed to parse Gemini response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl From<&GenerationParams> for GenerationConfig {
    fn from(params: &GenerationParams) -> Self {
        Self {
            temperature: params.temperature,
            top_k: params.top_k,
            top_p: params.top_p,
            max_output_tokens: params.max_output_tokens,
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Takes `candidates[0].content.parts[0].text`; anything missing or blank is
/// a malformed payload.
fn extract_text_response(response: GenerateContentResponse) -> Result<String, ResponseError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| {
            ResponseError::malformed("Gemini API returned no text in the first candidate")
        })
}

fn map_http_error(status: StatusCode, body: &str) -> ResponseError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    ResponseError::http_status(status.as_u16(), message)
}
