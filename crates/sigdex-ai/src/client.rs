//! HTTP client for OpenAI-compatible chat-completions providers.
//!
//! Wraps `reqwest` with provider error handling and response unwrapping.
//! An alternate API base can be supplied to route through OpenRouter-style
//! compatible providers, or through a mock server in tests.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use crate::error::AiError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: Url,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Creates a client for the given model. `api_base = None` uses the
    /// OpenAI production URL.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`AiError::Api`] if `api_base` is not a valid URL.
    pub fn new(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        api_base: Option<&str>,
    ) -> Result<Self, AiError> {
        Self::with_base_url(
            api_key,
            model,
            timeout_secs,
            api_base.unwrap_or(DEFAULT_BASE_URL),
        )
    }

    /// Creates a client with an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`AiError::Api`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        // Normalise to a trailing slash so join() appends rather than
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| AiError::Api {
            status: 0,
            body: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            model: model.to_owned(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user prompt pair and return the completion text.
    ///
    /// Requests deterministic output: `temperature 0` and a JSON response
    /// format, with a bounded completion size.
    ///
    /// # Errors
    ///
    /// - [`AiError::Http`] on network failure or timeout.
    /// - [`AiError::Api`] on a non-2xx provider status.
    /// - [`AiError::Json`] if the completion envelope cannot be parsed.
    /// - [`AiError::EmptyResponse`] if the envelope has no content.
    pub async fn chat(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        let url = self.base_url.join("chat/completions").map_err(|e| AiError::Api {
            status: 0,
            body: format!("invalid endpoint URL: {e}"),
        })?;

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": 0,
            "max_tokens": max_tokens,
            "response_format": {"type": "json_object"},
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let envelope: ChatResponse =
            serde_json::from_str(&text).map_err(|e| AiError::Json {
                context: "chat completion envelope".to_string(),
                source: e,
            })?;

        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}
