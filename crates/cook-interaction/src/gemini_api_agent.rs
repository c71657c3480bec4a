//! GeminiApiAgent - Direct REST API implementation for Gemini.
//!
//! Credentials come from the environment or secret.json.

use async_trait::async_trait;
use cook_core::config::SecretConfig;
use cook_infrastructure::SecretStorage;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::advisor::Advisor;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variables checked for an API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Errors raised while talking to Gemini. Never escapes [`Advisor::advise`].
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("Gemini API request failed: {0}")]
    Transport(String),

    #[error("Gemini API returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to parse Gemini response: {0}")]
    Malformed(String),

    #[error("Gemini API returned no text in the response candidates")]
    EmptyResponse,

    #[error("Gemini credentials not found: {0}")]
    MissingCredentials(String),
}

/// Advisor implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiApiAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiApiAgent")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeminiApiAgent {
    /// Creates a new agent with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Resolves a credential from `GOOGLE_API_KEY`, `GEMINI_API_KEY`, then
    /// the secret file.
    ///
    /// `model` is used unless secret.json names one.
    pub fn try_from_env(secrets: &SecretStorage, model: &str) -> Result<Self, AdvisoryError> {
        let secret_config = match secrets.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable secret file");
                None
            }
        };

        let (api_key, secret_model) =
            resolve_credentials(|name| std::env::var(name).ok(), secret_config).ok_or_else(|| {
                AdvisoryError::MissingCredentials(format!(
                    "set {} or add a gemini section to {}",
                    API_KEY_VARS.join(" / "),
                    secrets.path().display()
                ))
            })?;

        let model = secret_model.unwrap_or_else(|| model.to_string());
        Ok(Self::new(api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the agent at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Sends one prompt and returns the generated text.
    pub async fn generate(&self, prompt: &str, max_output: u32) -> Result<String, AdvisoryError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_output,
            },
        };
        self.send_request(&request).await
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, AdvisoryError> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.base_url,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|err| AdvisoryError::Transport(err.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| AdvisoryError::Malformed(err.without_url().to_string()))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl Advisor for GeminiApiAgent {
    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    async fn advise(&self, prompt: &str, max_output: u32) -> String {
        match self.generate(prompt, max_output).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(model = %self.model, "[gemini:error] {e}");
                String::new()
            }
        }
    }
}

/// Picks an API key (and optional model) from the environment, then secrets.
pub fn resolve_credentials(
    env: impl Fn(&str) -> Option<String>,
    secrets: Option<SecretConfig>,
) -> Option<(String, Option<String>)> {
    if let Some(key) = API_KEY_VARS
        .iter()
        .filter_map(|name| env(name))
        .find(|value| !value.trim().is_empty())
    {
        let model = secrets.and_then(|s| s.gemini).and_then(|g| g.model_name);
        return Some((key, model));
    }

    secrets
        .and_then(|s| s.gemini)
        .filter(|g| !g.api_key.trim().is_empty())
        .map(|g| (g.api_key, g.model_name))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
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

fn extract_text_response(response: GenerateContentResponse) -> Result<String, AdvisoryError> {
    let text = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        Err(AdvisoryError::EmptyResponse)
    } else {
        Ok(text.to_string())
    }
}

fn map_http_error(status: StatusCode, body: String) -> AdvisoryError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    AdvisoryError::Http {
        status: status.as_u16(),
        message,
    }
}
